//! Build-cache behaviour observed through the compile marker.
//!
//! `force_src_.d` prints [`COMPILE_MARKER`] at compile time, so the marker in the output means "rebuilt" and
//! its absence means "served from cache". The first three scenarios here are order-dependent by construction;
//! the rest warm the cache themselves.

use super::{COMPILE_MARKER, ScenarioContext};
use crate::assertions::{AssertionFailure, expect_contains, expect_not_contains, expect_status};
use crate::driver::ArgumentVector;
use crate::error::{ScenarioError, ScenarioResult};

pub fn first_run_compiles(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let res = ctx.run(ctx.tool().file(ctx.shared.force_source()))?;
    expect_status(&res, 0)?;
    expect_contains(&res, COMPILE_MARKER)?;
    Ok(())
}

/// Relies on `first_run_compiles` having warmed the cache.
pub fn second_run_hits_cache(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let res = ctx.run(ctx.tool().file(ctx.shared.force_source()))?;
    expect_status(&res, 0)?;
    expect_not_contains(&res, COMPILE_MARKER)?;
    Ok(())
}

pub fn force_always_recompiles(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let res = ctx.run(ctx.tool().arg("--force").file(ctx.shared.force_source()))?;
    expect_status(&res, 0)?;
    expect_contains(&res, COMPILE_MARKER)?;
    Ok(())
}

/// Run the shared source once so later invocations can expect a hit.
fn warm(ctx: &ScenarioContext<'_>, extra: &[&str]) -> ScenarioResult {
    let res = ctx.run(ctx.tool().args(extra.iter().copied()).file(ctx.shared.force_source()))?;
    expect_status(&res, 0)?;
    Ok(())
}

pub fn cwd_change_keeps_cache(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.shared.force_source();
    let (Some(dir), Some(name)) = (src.parent(), src.file_name()) else {
        return Err(AssertionFailure::standalone(format!("'{}' has no parent directory", src.display())).into());
    };

    warm(ctx, &[])?;
    let res = ctx.run(ctx.tool().file(src))?;
    expect_status(&res, 0)?;
    expect_not_contains(&res, COMPILE_MARKER)?;

    let res = ctx.run_in(ctx.tool().arg(name.to_string_lossy()), dir)?;
    expect_status(&res, 0)?;
    expect_not_contains(&res, COMPILE_MARKER)?;
    Ok(())
}

pub fn compiler_change_forces_rebuild(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let Some(full_path) = ctx.config.compiler_full_path() else {
        return Err(ScenarioError::skipped(format!(
            "cannot resolve '{}' on PATH to a different spelling",
            ctx.config.compiler()
        )));
    };
    let src = ctx.shared.force_source();

    warm(ctx, &[])?;
    let res = ctx.run(ctx.tool().file(src))?;
    expect_status(&res, 0)?;
    expect_not_contains(&res, COMPILE_MARKER)?;

    // Same compiler, different spelling: the cache key must change.
    let argv = ArgumentVector::new(ctx.config.tool())
        .path_arg("--compiler=", &full_path)
        .arg(ctx.config.model_switch())
        .file(src);
    let res = ctx.run(argv)?;
    expect_status(&res, 0)?;
    expect_contains(&res, COMPILE_MARKER)?;
    Ok(())
}

pub fn tmpdir_override_compiles(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    warm(ctx, &["--build-only"])?;

    let tmpdir = ctx.scope.dir("rdmdTest")?;
    let res = ctx.run(
        ctx.tool()
            .path_arg("--tmpdir=", tmpdir.path())
            .arg("--build-only")
            .file(ctx.shared.force_source()),
    )?;
    expect_status(&res, 0)?;
    expect_contains(&res, COMPILE_MARKER)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::Invocation;
    use crate::scenario::FORCE_SOURCE_NAME;
    use crate::scenario::testing::{
        Reply, has, is_assertion_failure, is_skipped, ok, run_scenario, run_scenario_with, value,
    };

    fn rebuilt() -> Reply {
        ok(&format!("{COMPILE_MARKER}\n"))
    }

    fn hit() -> Reply {
        ok("")
    }

    #[test]
    fn test_first_run_needs_marker() {
        assert!(run_scenario(first_run_compiles, |_| rebuilt()).is_ok());
        assert!(is_assertion_failure(&run_scenario(first_run_compiles, |_| hit())));
    }

    #[test]
    fn test_second_run_rejects_rebuild() {
        assert!(run_scenario(second_run_hits_cache, |_| hit()).is_ok());
        assert!(is_assertion_failure(&run_scenario(second_run_hits_cache, |_| rebuilt())));
    }

    #[test]
    fn test_force_must_rebuild() {
        let honours_force = |inv: &Invocation| if has(inv, "--force") { rebuilt() } else { hit() };
        assert!(run_scenario(force_always_recompiles, honours_force).is_ok());
        assert!(is_assertion_failure(&run_scenario(force_always_recompiles, |_| hit())));
    }

    #[test]
    fn test_cwd_change_runs_relative_name_from_source_dir() {
        let result = run_scenario(cwd_change_keeps_cache, |inv| {
            if let Some(dir) = &inv.current_dir {
                assert_eq!(inv.argv.arguments().last().unwrap(), FORCE_SOURCE_NAME);
                assert!(dir.join(FORCE_SOURCE_NAME).is_file());
            }
            hit()
        });
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_cwd_change_rejects_cache_keyed_on_cwd() {
        let keyed_on_cwd = |inv: &Invocation| if inv.current_dir.is_some() { rebuilt() } else { hit() };
        assert!(is_assertion_failure(&run_scenario(cwd_change_keeps_cache, keyed_on_cwd)));
    }

    #[cfg(unix)]
    #[test]
    fn test_compiler_spelling_must_change_cache_key() {
        // `sh` is on PATH everywhere the harness runs, so it has a full-path spelling.
        let keyed_on_compiler = |inv: &Invocation| {
            if value(inv, "--compiler=/").is_some() { rebuilt() } else { hit() }
        };
        assert!(run_scenario_with(compiler_change_forces_rebuild, "sh", keyed_on_compiler).is_ok());
        assert!(is_assertion_failure(&run_scenario_with(compiler_change_forces_rebuild, "sh", |_| hit())));
    }

    #[test]
    fn test_compiler_change_skipped_when_not_on_path() {
        let result = run_scenario_with(compiler_change_forces_rebuild, "no-such-compiler-on-path", |_| hit());
        assert!(is_skipped(&result));
    }

    #[test]
    fn test_tmpdir_override_needs_fresh_build() {
        let honours_tmpdir = |inv: &Invocation| {
            if let Some(dir) = value(inv, "--tmpdir=") {
                assert!(std::path::Path::new(dir).is_dir());
                rebuilt()
            } else {
                hit()
            }
        };
        assert!(run_scenario(tmpdir_override_compiles, honours_tmpdir).is_ok());
        assert!(is_assertion_failure(&run_scenario(tmpdir_override_compiles, |_| hit())));
    }
}
