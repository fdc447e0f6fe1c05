//! CLI module for the rdmd harness
//!
//! This module provides the command-line interface: parse flags, validate them into a [`HarnessConfig`], run
//! the scenario battery, optionally run the stress driver, and map the outcome to an exit code.
//!
//! ## Exit codes
//!
//! - `0` - every scenario passed or was skipped, and the stress run (if any) was clean
//! - `1` - a scenario failed or errored, or the stress run recorded a failure
//! - `2` - setup failed before any scenario ran (missing tool, unusable temp directory)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! `execute` returns `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::config::{DEFAULT_COMPILER, DEFAULT_MODEL, HarnessConfig, StressConfig};
use crate::driver::ProcessDriver;
use crate::error::HarnessError;
use crate::fixture::FixtureManager;
use crate::report::{ConsoleReporter, JsonReporter, ScenarioReporter};
use crate::scenario::{ScenarioRunner, battery};
use crate::stress::StressDriver;
use crate::version::HARNESS_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const SETUP: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// A setup failure (exit code 2), rendered through miette so help text and codes are shown.
    pub fn setup(error: HarnessError) -> Self {
        Self::new(format!("{:?}", miette::Report::new(error)), ExitCode::SETUP)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

/// Black-box test harness for rdmd
#[derive(Parser, Debug)]
#[command(name = "rdmd-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Black-box test harness for the rdmd build-and-run tool", long_about = None)]
pub struct Cli {
    /// Path to the rdmd binary under test
    #[arg(value_name = "TOOL")]
    pub tool: PathBuf,

    /// Compiler rdmd should drive (passed as --compiler=)
    #[arg(long, value_name = "NAME", default_value = DEFAULT_COMPILER)]
    pub compiler: String,

    /// Memory model (passed as -m<MODEL>)
    #[arg(short, long, value_name = "MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Run the concurrency stress driver after the battery
    #[arg(long)]
    pub concurrency: bool,

    /// Number of stress workers (default: available parallelism)
    #[arg(long, value_name = "N", requires = "concurrency", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Invocations per stress worker
    #[arg(long, value_name = "N", requires = "concurrency", value_parser = clap::value_parser!(u64).range(1..))]
    pub iterations: Option<u64>,

    /// Seed for the stress RNG (random when omitted; always reported)
    #[arg(long, value_name = "N", requires = "concurrency")]
    pub seed: Option<u64>,

    /// Stop the battery at the first failing scenario
    #[arg(short = 'x', long = "fail-fast")]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Verbose console output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn stress_config(&self) -> Option<StressConfig> {
        if !self.concurrency {
            return None;
        }
        let defaults = StressConfig::default();
        Some(StressConfig {
            workers: self.workers.map_or(defaults.workers, |n| n as usize),
            iterations: self.iterations.map_or(defaults.iterations, |n| n as usize),
            seed: self.seed,
        })
    }

    /// Validate the parsed flags into a run configuration.
    pub fn harness_config(&self) -> Result<HarnessConfig, HarnessError> {
        let mut config = HarnessConfig::new(&self.tool, self.compiler.clone(), self.model.clone())?;
        config.fail_fast = self.fail_fast;
        config.stress = self.stress_config();
        Ok(config)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. Everything below
/// returns `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code != ExitCode::SUCCESS {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the harness and return the exit code.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.harness_config().map_err(CliError::setup)?;
    tracing::info!(
        tool = %config.tool().display(),
        compiler = config.compiler(),
        model = %config.model_switch(),
        "harness configured"
    );

    let fixtures = FixtureManager::new().map_err(CliError::setup)?;
    let driver = Arc::new(ProcessDriver);

    let mut reporter: Box<dyn ScenarioReporter> = match cli.format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(cli.verbose)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let runner = ScenarioRunner::new(&config, driver.as_ref(), &fixtures);
    let mut summary = runner.run(battery(), reporter.as_mut()).map_err(CliError::setup)?;

    if let Some(stress) = &config.stress {
        let report = StressDriver::new(&config, stress, driver.clone())
            .and_then(|stress_driver| stress_driver.run(&fixtures))
            .map_err(|e| CliError::new(format!("{:?}", miette::Report::new(e)), ExitCode::FAILURE))?;
        reporter.on_stress_complete(&report);
        summary.stress = Some(report);
    }

    reporter.on_run_complete(&summary);

    if let Err(e) = fixtures.close() {
        tracing::warn!(error = %e, "failed to remove run directory");
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ============================================================================
// Tests
// ============================================================================
