//! ProcessDriver against real child processes, using `/bin/sh` as a stand-in for the tool.

#![cfg(unix)]

use std::path::Path;

use rdmd_harness::driver::{ArgumentVector, CaseDriver, Invocation, ProcessDriver};
use rdmd_harness::platform::SIGSEGV;

fn sh(script: &str) -> ArgumentVector {
    ArgumentVector::new("/bin/sh").args(["-c", script])
}

#[test]
fn test_exit_status_passes_through() {
    let res = ProcessDriver.run(&sh("exit 3")).unwrap();
    assert_eq!(res.status, 3);
    assert!(!res.success());

    let res = ProcessDriver.run(&sh("exit 0")).unwrap();
    assert!(res.success());
}

#[test]
fn test_signal_death_is_negative_status() {
    let res = ProcessDriver.run(&sh("kill -SEGV $$")).unwrap();
    assert_eq!(res.status, -SIGSEGV);
}

#[test]
fn test_merged_output_keeps_interleaving() {
    let res = ProcessDriver
        .run(&sh("echo one; echo two >&2; echo three; echo four >&2"))
        .unwrap();
    let lines: Vec<&str> = res.output.lines().collect();
    assert_eq!(lines, ["one", "two", "three", "four"]);
}

#[test]
fn test_stdin_is_forwarded() {
    let invocation = Invocation::new(sh("while read line; do echo \"got $line\"; done")).stdin("a\nb\n");
    let res = ProcessDriver.run_invocation(&invocation).unwrap();
    assert_eq!(res.status, 0);
    assert_eq!(res.output, "got a\ngot b\n");
}

#[test]
fn test_no_stdin_reads_eof() {
    let res = ProcessDriver.run(&sh("cat; echo done")).unwrap();
    assert_eq!(res.output, "done\n");
}

#[test]
fn test_current_dir_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let invocation = Invocation::new(sh("pwd -P")).current_dir(dir.path());
    let res = ProcessDriver.run_invocation(&invocation).unwrap();
    assert_eq!(Path::new(res.output.trim()), canonical);
}

#[test]
fn test_command_is_recorded() {
    let res = ProcessDriver.run(&sh("exit 0")).unwrap();
    assert_eq!(res.command, "/bin/sh -c exit 0");
}

#[test]
fn test_unread_stdin_keeps_status_and_output() {
    // The child exits before consuming its input, as a tool does when the build fails.
    let input = "line of input\n".repeat(32 * 1024);
    let invocation = Invocation::new(sh("echo compile error; exit 1")).stdin(input);
    let res = ProcessDriver.run_invocation(&invocation).unwrap();
    assert_eq!(res.status, 1);
    assert_eq!(res.output, "compile error\n");
}

#[test]
fn test_large_stdin_echoed_without_deadlock() {
    let input = "0123456789abcdef\n".repeat(32 * 1024);
    let invocation = Invocation::new(sh("cat")).stdin(input.clone());
    let res = ProcessDriver.run_invocation(&invocation).unwrap();
    assert_eq!(res.status, 0);
    assert_eq!(res.output.len(), input.len());
    assert!(res.output == input);
}
