//! Scenario battery
//!
//! A scenario is a named function that builds fixtures inside its own [`ScenarioScope`], invokes the tool
//! through the [`CaseDriver`], and asserts on the result.
//!
//! ## Modules
//!
//! - `battery` - the fixed, ordered scenario list
//! - `cache` - cache hit/miss behaviour (force, cwd changes, compiler changes, tmpdir override)
//! - `modes` - usage, build-only, chatty, dry-run, eval, loop, main, exit-status propagation
//! - `deps` - exclude/include/extra-file resolution and dependency listings
//! - `artifacts` - where output files land (or must not land)
//! - `runner` - sequential execution with per-scenario outcomes

// Enforce explicit error handling - scenario bodies propagate with `?`
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod artifacts;
pub mod battery;
pub mod cache;
pub mod deps;
pub mod modes;
pub mod runner;
#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assertions::AssertionFailure;
use crate::config::HarnessConfig;
use crate::driver::{ArgumentVector, CaseDriver, Invocation, InvocationResult};
use crate::error::{HarnessError, ScenarioResult};
use crate::fixture::{Fixture, FixtureManager, ScenarioScope};
use crate::stress::StressReport;

pub use battery::battery;
pub use runner::ScenarioRunner;

/// Source whose compilation announces itself, so cache hits are visible as the marker's absence.
pub const FORCE_SOURCE_NAME: &str = "force_src_.d";
pub const COMPILE_MARKER: &str = "compile_force_src";
pub const FORCE_SOURCE: &str = r#"void main() { pragma(msg, "compile_force_src"); }"#;

pub type ScenarioFn = fn(&ScenarioContext<'_>) -> ScenarioResult;

/// One entry in the battery.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub summary: &'static str,
    pub run: ScenarioFn,
}

impl Scenario {
    pub const fn new(name: &'static str, summary: &'static str, run: ScenarioFn) -> Self {
        Self { name, summary, run }
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Fixtures that live for the whole run.
pub struct SharedFixtures {
    force_source: Fixture,
}

impl SharedFixtures {
    pub fn create(fixtures: &FixtureManager) -> Result<Self, HarnessError> {
        Ok(Self {
            force_source: fixtures.shared_file(FORCE_SOURCE_NAME, FORCE_SOURCE)?,
        })
    }

    /// `force_src_.d`, shared by every cache scenario.
    pub fn force_source(&self) -> &Path {
        self.force_source.path()
    }
}

/// Everything a scenario body may touch.
pub struct ScenarioContext<'a> {
    pub config: &'a HarnessConfig,
    pub driver: &'a dyn CaseDriver,
    pub scope: &'a ScenarioScope,
    pub shared: &'a SharedFixtures,
}

impl ScenarioContext<'_> {
    /// Tool argv with the configured compiler selected.
    pub fn tool(&self) -> ArgumentVector {
        self.config.tool_args()
    }

    pub fn run(&self, argv: ArgumentVector) -> Result<InvocationResult, HarnessError> {
        self.driver.run_invocation(&Invocation::new(argv))
    }

    pub fn run_in(&self, argv: ArgumentVector, dir: &Path) -> Result<InvocationResult, HarnessError> {
        self.driver.run_invocation(&Invocation::new(argv).current_dir(dir))
    }

    pub fn run_with_stdin(&self, argv: ArgumentVector, input: &str) -> Result<InvocationResult, HarnessError> {
        self.driver.run_invocation(&Invocation::new(argv).stdin(input))
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.scope.join(relative)
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of running a single scenario.
#[derive(Debug)]
pub enum ScenarioOutcome {
    Passed(Duration),
    Failed(Duration, AssertionFailure),
    Errored(Duration, HarnessError),
    Skipped(String),
}

impl ScenarioOutcome {
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Failed(..) | Self::Errored(..))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed(_) => "passed",
            Self::Failed(..) => "failed",
            Self::Errored(..) => "error",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Summary of a harness run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    /// Scenarios never started because `--fail-fast` stopped the battery.
    pub not_run: usize,
    pub duration: Duration,
    pub stress: Option<StressReport>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ScenarioOutcome) {
        match outcome {
            ScenarioOutcome::Passed(_) => self.passed += 1,
            ScenarioOutcome::Failed(..) => self.failed += 1,
            ScenarioOutcome::Errored(..) => self.errored += 1,
            ScenarioOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
            && self.errored == 0
            && self.not_run == 0
            && self.stress.as_ref().is_none_or(StressReport::is_success)
    }
}
