//! Sequential scenario execution.
//!
//! Scenarios run strictly one after another: each blocks on its own child processes before the next
//! scenario's fixtures are created. Every scenario yields a [`ScenarioOutcome`]; the battery only stops early
//! when `fail_fast` is set.

use std::time::Instant;

use super::{RunSummary, Scenario, ScenarioContext, ScenarioOutcome, SharedFixtures};
use crate::config::HarnessConfig;
use crate::driver::CaseDriver;
use crate::error::{HarnessError, ScenarioError};
use crate::fixture::FixtureManager;
use crate::report::ScenarioReporter;

pub struct ScenarioRunner<'a> {
    config: &'a HarnessConfig,
    driver: &'a dyn CaseDriver,
    fixtures: &'a FixtureManager,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(config: &'a HarnessConfig, driver: &'a dyn CaseDriver, fixtures: &'a FixtureManager) -> Self {
        Self {
            config,
            driver,
            fixtures,
        }
    }

    /// Run `battery` in order. Only a failure to create run-scoped fixtures is returned as `Err`.
    #[tracing::instrument(skip_all, fields(scenarios = battery.len(), fail_fast = self.config.fail_fast))]
    pub fn run(&self, battery: &[Scenario], reporter: &mut dyn ScenarioReporter) -> Result<RunSummary, HarnessError> {
        let start = Instant::now();
        let shared = SharedFixtures::create(self.fixtures)?;

        let mut summary = RunSummary {
            total: battery.len(),
            ..RunSummary::default()
        };
        reporter.on_run_start(battery.len());

        for (idx, scenario) in battery.iter().enumerate() {
            reporter.on_scenario_start(scenario);
            let outcome = self.run_one(scenario, &shared);
            summary.record(&outcome);
            reporter.on_scenario_complete(scenario, &outcome);

            if self.config.fail_fast && outcome.is_problem() {
                summary.not_run = battery.len() - idx - 1;
                tracing::warn!(scenario = scenario.name, skipped = summary.not_run, "fail-fast: stopping battery");
                break;
            }
        }

        summary.duration = start.elapsed();
        Ok(summary)
    }

    fn run_one(&self, scenario: &Scenario, shared: &SharedFixtures) -> ScenarioOutcome {
        let start = Instant::now();
        let scope = match self.fixtures.scope(scenario.name) {
            Ok(scope) => scope,
            Err(e) => return ScenarioOutcome::Errored(start.elapsed(), e),
        };
        let ctx = ScenarioContext {
            config: self.config,
            driver: self.driver,
            scope: &scope,
            shared,
        };

        tracing::debug!(scenario = scenario.name, "starting scenario");
        let result = (scenario.run)(&ctx);
        let elapsed = start.elapsed();
        match result {
            Ok(()) => ScenarioOutcome::Passed(elapsed),
            Err(ScenarioError::Assertion(failure)) => ScenarioOutcome::Failed(elapsed, failure),
            Err(ScenarioError::Setup(e)) => ScenarioOutcome::Errored(elapsed, e),
            Err(ScenarioError::Skipped(reason)) => ScenarioOutcome::Skipped(reason),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::assertions::{expect_contains, expect_status};
    use crate::driver::{Invocation, InvocationResult};
    use crate::error::ScenarioResult;
    use crate::report::RecordingReporter;

    /// Replies with a fixed output and records every argv it sees.
    struct ScriptedDriver {
        output: String,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedDriver {
        fn new(output: &str) -> Self {
            Self {
                output: output.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CaseDriver for ScriptedDriver {
        fn run_invocation(&self, invocation: &Invocation) -> Result<InvocationResult, HarnessError> {
            self.seen.lock().unwrap().push(invocation.argv.to_string());
            Ok(InvocationResult {
                status: 0,
                output: self.output.clone(),
                command: invocation.argv.to_string(),
            })
        }
    }

    fn passes(ctx: &ScenarioContext<'_>) -> ScenarioResult {
        let res = ctx.run(ctx.tool().arg("--force").arg(ctx.shared.force_source().display().to_string()))?;
        expect_status(&res, 0)?;
        Ok(())
    }

    fn fails(ctx: &ScenarioContext<'_>) -> ScenarioResult {
        let res = ctx.run(ctx.tool())?;
        expect_contains(&res, "never printed")?;
        Ok(())
    }

    fn skips(_ctx: &ScenarioContext<'_>) -> ScenarioResult {
        Err(ScenarioError::skipped("not on this host"))
    }

    fn collides(ctx: &ScenarioContext<'_>) -> ScenarioResult {
        let _a = ctx.scope.file("dup.d", "x")?;
        let _b = ctx.scope.file("dup.d", "y")?;
        Ok(())
    }

    fn config() -> HarnessConfig {
        HarnessConfig::new(&std::env::current_exe().unwrap(), "dmd", "64").unwrap()
    }

    const BATTERY: [Scenario; 4] = [
        Scenario::new("passes", "", passes),
        Scenario::new("fails", "", fails),
        Scenario::new("skips", "", skips),
        Scenario::new("collides", "", collides),
    ];

    #[test]
    fn test_every_scenario_reported_without_fail_fast() {
        let config = config();
        let driver = ScriptedDriver::new("ok");
        let fixtures = FixtureManager::new().unwrap();
        let mut reporter = RecordingReporter::default();

        let summary = ScenarioRunner::new(&config, &driver, &fixtures)
            .run(&BATTERY, &mut reporter)
            .unwrap();

        assert_eq!((summary.passed, summary.failed, summary.skipped, summary.errored), (1, 1, 1, 1));
        assert_eq!(summary.not_run, 0);
        assert!(!summary.is_success());
        assert_eq!(
            reporter.completed,
            vec![
                ("passes".to_string(), "passed"),
                ("fails".to_string(), "failed"),
                ("skips".to_string(), "skipped"),
                ("collides".to_string(), "error"),
            ]
        );
    }

    #[test]
    fn test_fail_fast_stops_after_first_failure() {
        let mut config = config();
        config.fail_fast = true;
        let driver = ScriptedDriver::new("ok");
        let fixtures = FixtureManager::new().unwrap();
        let mut reporter = RecordingReporter::default();

        let summary = ScenarioRunner::new(&config, &driver, &fixtures)
            .run(&BATTERY, &mut reporter)
            .unwrap();

        assert_eq!(reporter.completed.len(), 2);
        assert_eq!(summary.not_run, 2);
        assert_eq!(driver.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_scenario_directories_cleaned_up() {
        let config = config();
        let driver = ScriptedDriver::new("ok");
        let fixtures = FixtureManager::new().unwrap();
        let mut reporter = RecordingReporter::default();

        ScenarioRunner::new(&config, &driver, &fixtures)
            .run(&BATTERY[..1], &mut reporter)
            .unwrap();

        assert!(!fixtures.root().join("passes").exists());
        let seen = driver.seen.lock().unwrap();
        assert!(seen[0].contains("--compiler=dmd -m64 --force"));
        assert!(seen[0].ends_with("force_src_.d"));
    }
}
