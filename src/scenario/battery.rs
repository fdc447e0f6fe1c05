//! The fixed, ordered scenario battery.
//!
//! Order matters for exactly three entries: `first_run_compiles` warms the cache that `second_run_hits_cache`
//! then expects to hit, and `force_always_recompiles` must rebuild right after that hit. Everything else sets
//! up its own preconditions.

use super::{Scenario, artifacts, cache, deps, modes};

const BATTERY: [Scenario; 26] = [
    Scenario::new(
        "usage_without_program",
        "no program prints usage and exits 1",
        modes::usage_without_program,
    ),
    Scenario::new(
        "first_run_compiles",
        "a fresh source is compiled",
        cache::first_run_compiles,
    ),
    Scenario::new(
        "second_run_hits_cache",
        "an unchanged source is not recompiled",
        cache::second_run_hits_cache,
    ),
    Scenario::new(
        "force_always_recompiles",
        "--force rebuilds even on a cache hit",
        cache::force_always_recompiles,
    ),
    Scenario::new(
        "build_only_skips_execution",
        "--build-only compiles without running",
        modes::build_only_skips_execution,
    ),
    Scenario::new("chatty_reports_stat", "--chatty shows stat calls", modes::chatty_reports_stat),
    Scenario::new(
        "dry_run_skips_build",
        "--dry-run announces but never builds",
        modes::dry_run_skips_build,
    ),
    Scenario::new("eval_runs_expression", "--eval runs a snippet", modes::eval_runs_expression),
    Scenario::new(
        "eval_rejects_program_file",
        "--eval plus a file is a user error",
        modes::eval_rejects_program_file,
    ),
    Scenario::new("loop_echoes_lines", "--loop processes stdin line by line", modes::loop_echoes_lines),
    Scenario::new(
        "loop_rejects_program_file",
        "--loop plus a file is a user error",
        modes::loop_rejects_program_file,
    ),
    Scenario::new(
        "exclude_requires_object",
        "--exclude needs the prebuilt object to link",
        deps::exclude_requires_object,
    ),
    Scenario::new(
        "include_resolves_outside_scope",
        "--include brings an excluded root back",
        deps::include_resolves_outside_scope,
    ),
    Scenario::new(
        "extra_file_satisfies_symbols",
        "--extra-file adds missing definitions",
        deps::extra_file_satisfies_symbols,
    ),
    Scenario::new(
        "makedepend_to_stdout",
        "--makedepend prints a make-style listing",
        deps::makedepend_to_stdout,
    ),
    Scenario::new(
        "makedepfile_to_file",
        "--makedepfile writes a make-style listing",
        deps::makedepfile_to_file,
    ),
    Scenario::new("main_synthesized", "--main adds an entry point", modes::main_synthesized),
    Scenario::new(
        "program_arguments_set_exit_code",
        "program arguments and exit status pass through",
        modes::program_arguments_set_exit_code,
    ),
    Scenario::new(
        "signal_propagates_as_negative_status",
        "a crash exits with -SIGSEGV",
        modes::signal_propagates_as_negative_status,
    ),
    Scenario::new(
        "cwd_change_keeps_cache",
        "a relative run from another cwd still hits",
        cache::cwd_change_keeps_cache,
    ),
    Scenario::new(
        "output_path_directory_conflict",
        "-of pointing at a directory fails",
        artifacts::output_path_directory_conflict,
    ),
    Scenario::new(
        "compiler_change_forces_rebuild",
        "a different --compiler spelling rebuilds",
        cache::compiler_change_forces_rebuild,
    ),
    Scenario::new(
        "tmpdir_override_compiles",
        "--tmpdir uses a fresh cache",
        cache::tmpdir_override_compiles,
    ),
    Scenario::new(
        "library_output_beside_source",
        "-lib output lands next to the source",
        artifacts::library_output_beside_source,
    ),
    Scenario::new(
        "no_artifact_without_build_only",
        "only --build-only leaves an executable",
        artifacts::no_artifact_without_build_only,
    ),
    Scenario::new(
        "output_path_gets_exe_suffix",
        "-of without extension gets .exe",
        artifacts::output_path_gets_exe_suffix,
    ),
];

/// Every scenario, in execution order.
pub fn battery() -> &'static [Scenario] {
    &BATTERY
}
