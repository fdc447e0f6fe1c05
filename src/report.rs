//! Run reporting.
//!
//! ## ScenarioReporter Trait
//!
//! The runner never prints directly; it drives a [`ScenarioReporter`]. Two implementations ship:
//!
//! - [`ConsoleReporter`] - pytest-style lines on stdout, captured output on failure
//! - [`JsonReporter`] - one JSON object per event, for CI pipelines

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::scenario::{RunSummary, Scenario, ScenarioOutcome};
use crate::stress::StressReport;

/// Trait for reporting harness progress and results.
pub trait ScenarioReporter {
    /// Called once before the first scenario
    fn on_run_start(&mut self, _scenario_count: usize) {}

    /// Called when a scenario begins
    fn on_scenario_start(&mut self, _scenario: &Scenario) {}

    /// Called when a scenario completes
    fn on_scenario_complete(&mut self, scenario: &Scenario, outcome: &ScenarioOutcome);

    /// Called after the optional stress run
    fn on_stress_complete(&mut self, report: &StressReport);

    /// Called once everything has finished
    fn on_run_complete(&mut self, summary: &RunSummary);
}

// ============================================================================
// Console
// ============================================================================

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ScenarioReporter for ConsoleReporter {
    fn on_run_start(&mut self, scenario_count: usize) {
        println!("\x1b[1m=================== rdmd harness ===================\x1b[0m");
        println!("collected {} scenario(s)", scenario_count);
        println!();
    }

    fn on_scenario_start(&mut self, scenario: &Scenario) {
        if self.verbose {
            println!("{} ... {}", scenario.name, scenario.summary);
        }
    }

    fn on_scenario_complete(&mut self, scenario: &Scenario, outcome: &ScenarioOutcome) {
        let status = match outcome {
            ScenarioOutcome::Passed(d) => format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis()),
            ScenarioOutcome::Failed(d, _) => format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis()),
            ScenarioOutcome::Errored(d, _) => format!("\x1b[31mERROR\x1b[0m ({:.0}ms)", d.as_millis()),
            ScenarioOutcome::Skipped(reason) => format!("\x1b[33mSKIPPED\x1b[0m ({})", reason),
        };
        println!("{} {}", scenario.name, status);

        match outcome {
            ScenarioOutcome::Failed(_, failure) => {
                println!();
                println!("\x1b[1m___________ {} ___________\x1b[0m", scenario.name);
                println!("{}", failure);
                println!();
            }
            ScenarioOutcome::Errored(_, error) => {
                println!("    setup error: {}", error);
                for cause in error_causes(error) {
                    println!("    caused by: {}", cause);
                }
            }
            _ => {}
        }
    }

    fn on_stress_complete(&mut self, report: &StressReport) {
        println!();
        println!(
            "stress: {} worker(s), {} invocation(s), seed {}",
            report.workers, report.invocations, report.seed
        );
        for failure in &report.failures {
            println!(
                "\x1b[31mstress worker {} failed\x1b[0m at iteration {} ({})",
                failure.worker, failure.iteration, failure.variant
            );
            println!("{}", failure.failure);
        }
        if !report.failures.is_empty() {
            println!("replay with --seed {}", report.seed);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }
        if summary.errored > 0 {
            parts.push(format!("{} errors", summary.errored));
        }
        if summary.skipped > 0 {
            parts.push(format!("{} skipped", summary.skipped));
        }
        if summary.not_run > 0 {
            parts.push(format!("{} not run", summary.not_run));
        }
        if let Some(stress) = &summary.stress {
            parts.push(if stress.is_success() {
                "stress ok".to_string()
            } else {
                format!("stress failed ({})", stress.failures.len())
            });
        }

        let color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        println!();
        println!(
            "{}====== {} in {:.2}s ======\x1b[0m",
            color,
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// Emits one JSON object per line.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: Value) {
        if let Err(e) = writeln!(self.out, "{value}") {
            tracing::warn!(error = %e, "failed to write JSON report line");
        }
    }
}

/// Display text of every `source()` below the top-level error, outermost first.
fn error_causes(error: &dyn std::error::Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

fn outcome_json(scenario: &Scenario, outcome: &ScenarioOutcome) -> Value {
    let mut value = json!({
        "event": "scenario",
        "name": scenario.name,
        "outcome": outcome.label(),
    });
    match outcome {
        ScenarioOutcome::Passed(d) => {
            value["duration_ms"] = json!(d.as_millis() as u64);
        }
        ScenarioOutcome::Failed(d, failure) => {
            value["duration_ms"] = json!(d.as_millis() as u64);
            value["message"] = json!(failure.message);
            value["command"] = json!(failure.command);
            value["status"] = json!(failure.status);
            value["output"] = json!(failure.output);
        }
        ScenarioOutcome::Errored(d, error) => {
            value["duration_ms"] = json!(d.as_millis() as u64);
            value["message"] = json!(error.to_string());
            value["causes"] = json!(error_causes(error));
        }
        ScenarioOutcome::Skipped(reason) => {
            value["message"] = json!(reason);
        }
    }
    value
}

impl<W: Write> ScenarioReporter for JsonReporter<W> {
    fn on_run_start(&mut self, scenario_count: usize) {
        self.emit(json!({ "event": "run_start", "scenarios": scenario_count }));
    }

    fn on_scenario_complete(&mut self, scenario: &Scenario, outcome: &ScenarioOutcome) {
        self.emit(outcome_json(scenario, outcome));
    }

    fn on_stress_complete(&mut self, report: &StressReport) {
        let failures: Vec<Value> = report
            .failures
            .iter()
            .map(|f| {
                json!({
                    "worker": f.worker,
                    "iteration": f.iteration,
                    "variant": f.variant,
                    "message": f.failure.message,
                    "status": f.failure.status,
                    "output": f.failure.output,
                })
            })
            .collect();
        self.emit(json!({
            "event": "stress",
            "seed": report.seed,
            "workers": report.workers,
            "invocations": report.invocations,
            "failures": failures,
        }));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.emit(json!({
            "event": "summary",
            "success": summary.is_success(),
            "total": summary.total,
            "passed": summary.passed,
            "failed": summary.failed,
            "errored": summary.errored,
            "skipped": summary.skipped,
            "not_run": summary.not_run,
            "duration_ms": summary.duration.as_millis() as u64,
        }));
    }
}

// ============================================================================
// Test support
// ============================================================================

/// Records scenario names and outcome labels in completion order.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingReporter {
    pub completed: Vec<(String, &'static str)>,
    pub stress_reports: usize,
}

#[cfg(test)]
impl ScenarioReporter for RecordingReporter {
    fn on_scenario_complete(&mut self, scenario: &Scenario, outcome: &ScenarioOutcome) {
        self.completed.push((scenario.name.to_string(), outcome.label()));
    }

    fn on_stress_complete(&mut self, _report: &StressReport) {
        self.stress_reports += 1;
    }

    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assertions::AssertionFailure;
    use crate::error::ScenarioResult;
    use crate::scenario::ScenarioContext;

    fn noop(_ctx: &ScenarioContext<'_>) -> ScenarioResult {
        Ok(())
    }

    #[test]
    fn test_json_failure_carries_output() {
        let scenario = Scenario::new("force_always_recompiles", "", noop);
        let outcome = ScenarioOutcome::Failed(
            Duration::from_millis(5),
            AssertionFailure {
                message: "expected output to contain \"compile_force_src\"".to_string(),
                command: "rdmd --force force_src_.d".to_string(),
                status: Some(0),
                output: "line one\nline two\n".to_string(),
            },
        );

        let mut reporter = JsonReporter::new(Vec::new());
        reporter.on_scenario_complete(&scenario, &outcome);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let value: Value = serde_json::from_str(text.trim()).unwrap();

        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["output"], "line one\nline two\n");
        assert_eq!(value["status"], 0);
        assert_eq!(value["duration_ms"], 5);
    }

    #[test]
    fn test_json_error_lists_causes() {
        let scenario = Scenario::new("makedepfile_to_file", "", noop);
        let outcome = ScenarioOutcome::Errored(
            Duration::from_millis(1),
            crate::error::HarnessError::Spawn {
                program: "/usr/bin/rdmd".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            },
        );

        let mut reporter = JsonReporter::new(Vec::new());
        reporter.on_scenario_complete(&scenario, &outcome);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let value: Value = serde_json::from_str(text.trim()).unwrap();

        assert_eq!(value["outcome"], "error");
        assert_eq!(value["message"], "failed to spawn '/usr/bin/rdmd'");
        assert_eq!(value["causes"], json!(["no such file or directory"]));
    }

    #[test]
    fn test_json_summary_line() {
        let summary = RunSummary {
            total: 3,
            passed: 2,
            skipped: 1,
            ..RunSummary::default()
        };
        let mut reporter = JsonReporter::new(Vec::new());
        reporter.on_run_complete(&summary);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let value: Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["event"], "summary");
        assert_eq!(value["success"], true);
        assert_eq!(value["skipped"], 1);
    }
}
