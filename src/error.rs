//! Error tiers for the harness.
//!
//! - [`HarnessError`]: setup failures (missing tool, fixture I/O, spawn errors). These are distinct from
//!   assertion failures and never mean the tool misbehaved.
//! - [`crate::assertions::AssertionFailure`]: the primary signal, a violated expectation about the tool.
//! - [`ScenarioError`]: what a scenario body returns; it folds both tiers together plus a skip marker.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::assertions::AssertionFailure;

/// Setup-tier failures.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("tool binary not found at '{}'", path.display())]
    #[diagnostic(
        code(harness::tool_not_found),
        help("pass the path to a built rdmd executable as the first positional argument")
    )]
    ToolNotFound { path: PathBuf },

    #[error("failed to prepare fixture '{}'", path.display())]
    #[diagnostic(code(harness::fixture))]
    Fixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("fixture path '{}' was already claimed in this run", path.display())]
    #[diagnostic(
        code(harness::fixture_collision),
        help("fixture names must be unique per run; give the scenario its own file name")
    )]
    FixtureCollision { path: PathBuf },

    #[error("failed to spawn '{program}'")]
    #[diagnostic(code(harness::spawn))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to capture output of '{program}'")]
    #[diagnostic(code(harness::capture))]
    Capture {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start the stress runtime")]
    #[diagnostic(code(harness::runtime))]
    Runtime(#[source] io::Error),

    #[error("invalid stress plan: {0}")]
    #[diagnostic(code(harness::stress_plan), help("every plan needs at least one variant with a nonzero weight"))]
    InvalidPlan(String),

    #[error("stress worker did not complete")]
    #[diagnostic(code(harness::worker_join))]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl HarnessError {
    pub fn fixture(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Fixture {
            path: path.into(),
            source,
        }
    }
}

/// Result of a scenario body.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error(transparent)]
    Setup(#[from] HarnessError),

    /// The scenario does not apply on this host/configuration.
    #[error("skipped: {0}")]
    Skipped(String),
}

impl ScenarioError {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }
}

pub type ScenarioResult = Result<(), ScenarioError>;
