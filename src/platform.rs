//! Platform-specific constants and exit-status decoding.
//!
//! The tool reports "killed by signal N" as exit status `-N` on POSIX hosts. Other hosts have no signal
//! granularity, so abnormal termination is only ever a nonzero status there.

use std::process::ExitStatus;

/// Executable suffix the compiler appends to produced programs (`""` or `".exe"`).
pub const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

/// Object-file extension produced by `-c`.
#[cfg(windows)]
pub const OBJ_EXT: &str = "obj";
#[cfg(not(windows))]
pub const OBJ_EXT: &str = "o";

/// Static-library extension produced by `-lib`.
#[cfg(windows)]
pub const LIB_EXT: &str = "lib";
#[cfg(not(windows))]
pub const LIB_EXT: &str = "a";

/// Segmentation fault signal number (identical on Linux, macOS, and the BSDs).
#[cfg(unix)]
pub const SIGSEGV: i32 = 11;

/// Collapse an [`ExitStatus`] into the integer protocol the harness asserts on.
#[cfg(unix)]
pub fn decode_status(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => -signal,
        // Stopped/continued children are never observed after `wait`; treat as a generic failure.
        (None, None) => 1,
    }
}

/// Collapse an [`ExitStatus`] into the integer protocol the harness asserts on.
#[cfg(not(unix))]
pub fn decode_status(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => 1,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    #[test]
    fn test_exit_code_passes_through() {
        // Raw wait status: exit code lives in the high byte.
        assert_eq!(decode_status(ExitStatus::from_raw(0)), 0);
        assert_eq!(decode_status(ExitStatus::from_raw(1 << 8)), 1);
        assert_eq!(decode_status(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_signal_becomes_negative() {
        assert_eq!(decode_status(ExitStatus::from_raw(SIGSEGV)), -SIGSEGV);
        assert_eq!(decode_status(ExitStatus::from_raw(9)), -9);
    }
}
