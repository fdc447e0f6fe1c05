//! Dependency resolution: exclusion, inclusion, extra files, and make-style dependency listings.

use std::fs;

use super::ScenarioContext;
use crate::assertions::{expect_dependency_listing, expect_path_exists, expect_status};
use crate::depfile::DependencyExpectation;
use crate::error::{HarnessError, ScenarioResult};
use crate::fixture::Fixture;
use crate::platform::OBJ_EXT;

const SUBMOD: &str = "module dsubpack.submod; void foo() { }";

/// `dsubpack/submod.d` inside the scenario directory.
fn submodule(ctx: &ScenarioContext<'_>) -> Result<Fixture, HarnessError> {
    ctx.scope.file("dsubpack/submod.d", SUBMOD)
}

pub fn exclude_requires_object(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sub_src = submodule(ctx)?;
    let sub_obj = ctx.path(&format!("dsubpack/submod.{OBJ_EXT}"));

    // Prebuild the dependency directly with the compiler.
    let res = ctx.run(
        ctx.config
            .compiler_args()
            .arg("-c")
            .path_arg("-of", &sub_obj)
            .file(sub_src.path()),
    )?;
    expect_status(&res, 0)?;

    let user = ctx.scope.file(
        "subModUser_.d",
        "module subModUser_; import dsubpack.submod; void main() { foo(); }",
    )?;

    let res = ctx.run(ctx.tool().args(["--force", "--exclude=dsubpack"]).file(user.path()))?;
    expect_status(&res, 1)?; // foo() unresolved at link time

    let res = ctx.run(
        ctx.tool()
            .args(["--force", "--exclude=dsubpack"])
            .file(&sub_obj)
            .file(user.path()),
    )?;
    expect_status(&res, 0)?;
    Ok(())
}

pub fn include_resolves_outside_scope(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    // `std` is excluded from source resolution by default.
    let _pkg = ctx.scope.file("std/foo.d", "module std.foo; void foobar() { }")?;
    let user = ctx.scope.file("stdUser_.d", "import std.foo; void main() { foobar(); }")?;

    let res = ctx.run(ctx.tool().arg("--force").file(user.path()))?;
    expect_status(&res, 1)?;

    let res = ctx.run(ctx.tool().args(["--force", "--include=std"]).file(user.path()))?;
    expect_status(&res, 0)?;
    Ok(())
}

pub fn extra_file_satisfies_symbols(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let _interface = ctx.scope.file("extraFile_.di", "module extraFile_; void f();")?;
    let implementation = ctx.scope.file("extraFile_.d", "module extraFile_; void f() { return; }")?;
    let main = ctx.scope.file(
        "extraFileMain_.d",
        "module extraFileMain_; import extraFile_; void main() { f(); }",
    )?;

    let res = ctx.run(ctx.tool().arg("--force").file(main.path()))?;
    expect_status(&res, 1)?; // undefined reference to f()

    let res = ctx.run(
        ctx.tool()
            .arg("--force")
            .path_arg("--extra-file=", implementation.path())
            .file(main.path()),
    )?;
    expect_status(&res, 0)?;
    Ok(())
}

pub fn makedepend_to_stdout(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sub = submodule(ctx)?;
    let dep_mod = ctx.scope.file("depMod_.d", "module depMod_; import dsubpack.submod; void main() { }")?;
    let target = dep_mod.path().with_extension("");

    let res = ctx.run(
        ctx.tool()
            .path_arg("-I", ctx.scope.path())
            .arg("--makedepend")
            .path_arg("-of", &target)
            .file(dep_mod.path()),
    )?;
    expect_status(&res, 0)?;

    let expected = DependencyExpectation::new(&target, dep_mod.path()).dependency(sub.path());
    expect_dependency_listing(&res.output, &expected, &res)?;
    Ok(())
}

pub fn makedepfile_to_file(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sub = submodule(ctx)?;
    let dep_mod = ctx.scope.file(
        "depModFail_.d",
        "module depMod_; import dsubpack.submod; void main() { assert(0); }",
    )?;
    let target = dep_mod.path().with_extension("");
    let depfile = ctx.path("depMak_.mak");

    let res = ctx.run(
        ctx.tool()
            .args(["--force", "--build-only"])
            .path_arg("-I", ctx.scope.path())
            .path_arg("--makedepfile=", &depfile)
            .path_arg("-of", &target)
            .file(dep_mod.path()),
    )?;
    expect_status(&res, 0)?; // built only, assert(0) never reached
    expect_path_exists(&depfile, "--makedepfile must write the listing")?;

    let listing = fs::read_to_string(&depfile).map_err(|e| HarnessError::fixture(&depfile, e))?;
    let expected = DependencyExpectation::new(&target, dep_mod.path()).dependency(sub.path());
    expect_dependency_listing(&listing, &expected, &res)?;
    Ok(())
}
