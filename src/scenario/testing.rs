//! Scripted stand-in for the tool, so scenario bodies can be exercised without a D toolchain.

use std::path::PathBuf;

use super::{ScenarioContext, ScenarioFn, SharedFixtures};
use crate::config::HarnessConfig;
use crate::driver::{CaseDriver, Invocation, InvocationResult};
use crate::error::{HarnessError, ScenarioError, ScenarioResult};
use crate::fixture::FixtureManager;

/// Exit status and merged output of one scripted invocation.
pub type Reply = (i32, String);

/// Answers every invocation through a closure over its argv, cwd and stdin.
struct ScriptedTool<F> {
    reply: F,
}

impl<F> CaseDriver for ScriptedTool<F>
where
    F: Fn(&Invocation) -> Reply + Send + Sync,
{
    fn run_invocation(&self, invocation: &Invocation) -> Result<InvocationResult, HarnessError> {
        let (status, output) = (self.reply)(invocation);
        Ok(InvocationResult {
            status,
            output,
            command: invocation.argv.to_string(),
        })
    }
}

/// Run one scenario body against the scripted tool, with `dmd` as the configured compiler.
pub fn run_scenario<F>(scenario: ScenarioFn, reply: F) -> ScenarioResult
where
    F: Fn(&Invocation) -> Reply + Send + Sync,
{
    run_scenario_with(scenario, "dmd", reply)
}

pub fn run_scenario_with<F>(scenario: ScenarioFn, compiler: &str, reply: F) -> ScenarioResult
where
    F: Fn(&Invocation) -> Reply + Send + Sync,
{
    let exe = std::env::current_exe().map_err(|e| HarnessError::fixture("current_exe", e))?;
    let config = HarnessConfig::new(&exe, compiler, "64")?;
    let fixtures = FixtureManager::new()?;
    let shared = SharedFixtures::create(&fixtures)?;
    let scope = fixtures.scope("scripted")?;
    let driver = ScriptedTool { reply };
    let ctx = ScenarioContext {
        config: &config,
        driver: &driver,
        scope: &scope,
        shared: &shared,
    };
    scenario(&ctx)
}

pub fn is_assertion_failure(result: &ScenarioResult) -> bool {
    matches!(result, Err(ScenarioError::Assertion(_)))
}

pub fn is_skipped(result: &ScenarioResult) -> bool {
    matches!(result, Err(ScenarioError::Skipped(_)))
}

pub fn status(code: i32) -> Reply {
    (code, String::new())
}

pub fn ok(output: &str) -> Reply {
    (0, output.to_string())
}

pub fn has(invocation: &Invocation, flag: &str) -> bool {
    invocation.argv.arguments().iter().any(|arg| arg == flag)
}

/// Remainder of the first argument starting with `prefix`.
pub fn value<'a>(invocation: &'a Invocation, prefix: &str) -> Option<&'a str> {
    invocation
        .argv
        .arguments()
        .iter()
        .find_map(|arg| arg.strip_prefix(prefix))
}

/// The last `.d` argument, i.e. the program file.
pub fn source(invocation: &Invocation) -> Option<PathBuf> {
    invocation
        .argv
        .arguments()
        .iter()
        .rev()
        .find(|arg| arg.ends_with(".d"))
        .map(PathBuf::from)
}

/// Whether the harness called the compiler directly rather than the tool.
pub fn is_compiler(invocation: &Invocation) -> bool {
    invocation.argv.program().as_os_str() == "dmd"
}
