//! Where build outputs land, and where they must not.

use std::env;
use std::path::{Path, PathBuf};

use super::ScenarioContext;
use crate::assertions::{expect_failure, expect_path_absent, expect_path_exists, expect_status};
use crate::error::{HarnessError, ScenarioResult};
use crate::platform::{EXE_SUFFIX, LIB_EXT};

const VOID_MAIN: &str = "void main() { }";

/// `dir/stem` + platform executable suffix.
fn executable_beside(src: &Path) -> PathBuf {
    PathBuf::from(format!("{}{EXE_SUFFIX}", src.with_extension("").display()))
}

pub fn output_path_directory_conflict(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file("of_conflict_.d", VOID_MAIN)?;
    let conflict = ctx.scope.dir("of_conflict_.dir")?;

    let res = ctx.run(ctx.tool().path_arg("-of", conflict.path()).file(src.path()))?;
    expect_failure(&res, "-of set to a directory")?;

    let res = ctx.run(ctx.tool().path_arg("-of=", conflict.path()).file(src.path()))?;
    expect_failure(&res, "-of= set to a directory")?;
    Ok(())
}

pub fn library_output_beside_source(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file("rdmdLib/test.d", "void fun() {}")?;
    let lib_name = format!("test.{LIB_EXT}");
    let beside = ctx.path(&format!("rdmdLib/{lib_name}"));

    // Only meaningful if nothing with that name was already sitting in our cwd.
    let stray = env::current_dir()
        .map_err(|e| HarnessError::fixture(".", e))?
        .join(&lib_name);
    let stray_preexisting = stray.exists();

    let res = ctx.run(ctx.tool().args(["--build-only", "--force", "-lib"]).file(src.path()))?;
    expect_status(&res, 0)?;
    expect_path_exists(&beside, "-lib output belongs next to its source")?;
    if !stray_preexisting {
        expect_path_absent(&stray, "-lib output must not land in the working directory")?;
    }
    Ok(())
}

pub fn no_artifact_without_build_only(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file("test_no_exe_.d", VOID_MAIN)?;
    let exe = executable_beside(src.path());

    let res = ctx.run(ctx.tool().file(src.path()))?;
    expect_status(&res, 0)?;
    expect_path_absent(&exe, "a plain run keeps its executable in the cache")?;

    let res = ctx.run(ctx.tool().arg("--build-only").file(src.path()))?;
    expect_status(&res, 0)?;
    expect_path_exists(&exe, "--build-only leaves the executable beside the source")?;
    Ok(())
}

#[cfg(windows)]
pub fn output_path_gets_exe_suffix(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let src = ctx.scope.file("of_app_.d", VOID_MAIN)?;
    let out = ctx.path("test_of_app");
    let res = ctx.run(ctx.tool().arg("--build-only").path_arg("-of", &out).file(src.path()))?;
    expect_status(&res, 0)?;
    expect_path_exists(&out.with_extension("exe"), "-of without an extension gets .exe")?;
    Ok(())
}

#[cfg(not(windows))]
pub fn output_path_gets_exe_suffix(_ctx: &ScenarioContext<'_>) -> ScenarioResult {
    Err(crate::error::ScenarioError::skipped("executable suffixes only exist on Windows"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;
    use crate::driver::Invocation;
    use crate::scenario::testing::{has, is_assertion_failure, is_skipped, run_scenario, source, status, value};

    #[test]
    fn test_executable_beside_strips_d_extension() {
        let exe = executable_beside(Path::new("/tmp/run/test_no_exe_.d"));
        assert_eq!(exe, PathBuf::from(format!("/tmp/run/test_no_exe_{EXE_SUFFIX}")));
    }

    fn output_is_dir(inv: &Invocation) -> bool {
        value(inv, "-of")
            .map(|path| path.trim_start_matches('='))
            .is_some_and(|path| Path::new(path).is_dir())
    }

    #[test]
    fn test_of_directory_rejected() {
        let rdmd = |inv: &Invocation| status(if output_is_dir(inv) { 1 } else { 0 });
        assert!(run_scenario(output_path_directory_conflict, rdmd).is_ok());
    }

    #[test]
    fn test_of_equals_directory_must_fail_too() {
        let rdmd = |inv: &Invocation| status(if value(inv, "-of=").is_some() { 0 } else { 1 });
        assert!(is_assertion_failure(&run_scenario(output_path_directory_conflict, rdmd)));
    }

    #[test]
    fn test_library_lands_beside_source() {
        let rdmd = |inv: &Invocation| {
            assert!(has(inv, "-lib"));
            let src = source(inv).unwrap();
            fs::write(src.with_file_name(format!("test.{LIB_EXT}")), "!<arch>\n").unwrap();
            status(0)
        };
        let result = run_scenario(library_output_beside_source, rdmd);
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_library_missing_fails() {
        assert!(is_assertion_failure(&run_scenario(library_output_beside_source, |_| status(0))));
    }

    #[test]
    fn test_executable_only_with_build_only() {
        let rdmd = |inv: &Invocation| {
            if has(inv, "--build-only") {
                fs::write(executable_beside(&source(inv).unwrap()), "").unwrap();
            }
            status(0)
        };
        let result = run_scenario(no_artifact_without_build_only, rdmd);
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_stray_executable_from_plain_run_fails() {
        let rdmd = |inv: &Invocation| {
            fs::write(executable_beside(&source(inv).unwrap()), "").unwrap();
            status(0)
        };
        assert!(is_assertion_failure(&run_scenario(no_artifact_without_build_only, rdmd)));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_exe_suffix_skipped_off_windows() {
        assert!(is_skipped(&run_scenario(output_path_gets_exe_suffix, |_| status(0))));
    }
}
