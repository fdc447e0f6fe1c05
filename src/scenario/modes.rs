//! Mode flags: usage, build-only, chatty, dry-run, eval, loop, main, and exit-status propagation.

use super::ScenarioContext;
use crate::assertions::{expect, expect_contains, expect_failure, expect_status};
use crate::error::ScenarioResult;

pub const USAGE_LINE: &str = "Usage: rdmd [RDMD AND DMD OPTIONS...] <program> [PROGRAM OPTIONS...]";

const VOID_MAIN: &str = "void main() { }";
const FAIL_RUNTIME: &str = "void main() { assert(0); }";
const FAIL_COMPTIME: &str = "void main() { static assert(0); }";
const COMPILER_BANNER: &str = "DMD v";

pub fn usage_without_program(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let res = ctx.run(ctx.config.bare_tool_args())?;
    expect_status(&res, 1)?;
    expect_contains(&res, USAGE_LINE)?;
    Ok(())
}

pub fn build_only_skips_execution(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let runtime = ctx.scope.file("fail_runtime_.d", FAIL_RUNTIME)?;
    let res = ctx.run(ctx.tool().args(["--force", "--build-only"]).file(runtime.path()))?;
    expect_status(&res, 0)?; // built, assert(0) never reached

    let res = ctx.run(ctx.tool().arg("--force").file(runtime.path()))?;
    expect_status(&res, 1)?;

    let comptime = ctx.scope.file("fail_comptime_.d", FAIL_COMPTIME)?;
    let res = ctx.run(ctx.tool().args(["--force", "--build-only"]).file(comptime.path()))?;
    expect_status(&res, 1)?;

    let res = ctx.run(ctx.tool().arg("--force").file(comptime.path()))?;
    expect_status(&res, 1)?;
    Ok(())
}

pub fn chatty_reports_stat(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file("void_main_.d", VOID_MAIN)?;
    let res = ctx.run(ctx.tool().args(["--force", "--chatty"]).file(src.path()))?;
    expect_status(&res, 0)?;
    expect_contains(&res, "stat ")?;
    Ok(())
}

pub fn dry_run_skips_build(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let comptime = ctx.scope.file("fail_comptime_.d", FAIL_COMPTIME)?;

    // A static assert would fail the build, so status 0 proves nothing was compiled.
    // Dry runs are chatty too.
    let res = ctx.run(ctx.tool().args(["--force", "--dry-run"]).file(comptime.path()))?;
    expect_status(&res, 0)?;
    expect_contains(&res, "stat ")?;
    expect_contains(&res, "mkdirRecurse ")?;

    let res = ctx.run(ctx.tool().args(["--force", "--dry-run", "--build-only"]).file(comptime.path()))?;
    expect_status(&res, 0)?;
    expect_contains(&res, "stat ")?;
    expect_contains(&res, "mkdirRecurse ")?;
    Ok(())
}

pub fn eval_runs_expression(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let res = ctx.run(ctx.tool().args(["--force", "-de", "--eval=writeln(`eval_works`);"]))?;
    expect_status(&res, 0)?;
    expect_contains(&res, "eval_works")?;

    // Compiler flags reach the evaluated snippet.
    let res = ctx.run(ctx.tool().args(["--force", "-debug", "--eval=debug {} else assert(false);"]))?;
    expect_status(&res, 0)?;
    Ok(())
}

pub fn eval_rejects_program_file(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    rejects_program_file(ctx, "--eval")
}

pub fn loop_echoes_lines(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    const INPUT: [&str; 3] = ["foo", "bar", "doo"];

    let res = ctx.run_with_stdin(
        ctx.tool().args(["--force", "--loop=writeln(line);"]),
        &format!("{}\n", INPUT.join("\n")),
    )?;
    expect_status(&res, 0)?;

    // Only blank lines and the compiler's version banner may surround the echoes.
    let echoed: Vec<&str> = res
        .output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMPILER_BANNER))
        .collect();
    expect(
        echoed == INPUT,
        format!("expected stdin lines echoed in order {INPUT:?}, got {echoed:?}"),
        &res,
    )?;
    Ok(())
}

pub fn loop_rejects_program_file(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    rejects_program_file(ctx, "--loop")
}

fn rejects_program_file(ctx: &ScenarioContext<'_>, mode: &str) -> ScenarioResult {
    let src = ctx.scope.file("void_main_.d", VOID_MAIN)?;
    let res = ctx.run(ctx.tool().arg("--force").arg(format!("{mode}=assert(true);")).file(src.path()))?;
    expect_failure(&res, &format!("{mode} combined with a program file"))?;
    expect_contains(
        &res,
        &format!("Cannot have both {mode} and a program file ('{}').", src.path().display()),
    )?;
    Ok(())
}

pub fn main_synthesized(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let no_main = ctx.scope.file("no_main_.d", "module no_main_; void foo() { }")?;
    let res = ctx.run(ctx.tool().args(["--force", "--main"]).file(no_main.path()))?;
    expect_status(&res, 0)?;

    let has_main = ctx.scope.file("has_main_.d", VOID_MAIN)?;
    let res = ctx.run(ctx.tool().args(["--force", "--main"]).file(has_main.path()))?;
    expect_failure(&res, "--main with an existing entry point")?;
    Ok(())
}

pub fn program_arguments_set_exit_code(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file(
        "int_main_.d",
        "int main(string[] args) { return cast(int) args.length; }",
    )?;
    // Everything after the program file belongs to the program: argv is [exe, a, b].
    let res = ctx.run(ctx.tool().arg("--force").file(src.path()).args(["a", "b"]))?;
    expect_status(&res, 3)?;
    Ok(())
}

#[cfg(unix)]
pub fn signal_propagates_as_negative_status(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file("crash_src_.d", "void main() { int *p; *p = 0; }")?;
    let res = ctx.run(ctx.tool().arg("--force").file(src.path()))?;
    expect_status(&res, -crate::platform::SIGSEGV)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn signal_propagates_as_negative_status(_ctx: &ScenarioContext<'_>) -> ScenarioResult {
    Err(crate::error::ScenarioError::skipped("signal exit codes are POSIX-only"))
}
