//! Case driver: spawn a child process, wait for it, and capture its merged output.
//!
//! ## I/O Boundary
//!
//! Process execution sits behind the [`CaseDriver`] trait so the runner and the stress driver can be exercised
//! with scripted drivers in tests. [`ProcessDriver`] is the real implementation.
//!
//! ## Known limitation
//!
//! No timeout is enforced: a child that never exits blocks the caller indefinitely.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use crate::error::HarnessError;
use crate::platform;

// ============================================================================
// Invocation types
// ============================================================================

/// A program plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    program: PathBuf,
    args: Vec<String>,
}

impl ArgumentVector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument, optionally glued to a flag prefix (`-of`, `--extra-file=`).
    pub fn path_arg(self, prefix: &str, path: &Path) -> Self {
        self.arg(format!("{prefix}{}", path.display()))
    }

    /// Append a bare path argument (a source or object file).
    pub fn file(self, path: &Path) -> Self {
        self.path_arg("", path)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// An argument vector plus the process environment it runs in.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub argv: ArgumentVector,
    pub current_dir: Option<PathBuf>,
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(argv: ArgumentVector) -> Self {
        Self {
            argv,
            current_dir: None,
            stdin: None,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Feed `input` to the child's stdin, then close it.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl From<ArgumentVector> for Invocation {
    fn from(argv: ArgumentVector) -> Self {
        Self::new(argv)
    }
}

/// Exit status plus merged stdout/stderr of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// `0` success, positive failure, negative `-signal` on POSIX.
    pub status: i32,
    /// stdout and stderr interleaved in the order the child wrote them.
    pub output: String,
    /// Rendered argv, kept for diagnostics.
    pub command: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

// ============================================================================
// Driver interface
// ============================================================================

/// Run an invocation to completion and capture its result.
pub trait CaseDriver: Send + Sync {
    fn run_invocation(&self, invocation: &Invocation) -> Result<InvocationResult, HarnessError>;

    fn run(&self, argv: &ArgumentVector) -> Result<InvocationResult, HarnessError> {
        self.run_invocation(&Invocation::new(argv.clone()))
    }
}

/// Spawns real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessDriver;

impl CaseDriver for ProcessDriver {
    #[tracing::instrument(skip_all, fields(command = %invocation.argv))]
    fn run_invocation(&self, invocation: &Invocation) -> Result<InvocationResult, HarnessError> {
        let command = invocation.argv.to_string();
        let program = invocation.argv.program().display().to_string();
        let spawn_err = |source: io::Error| HarnessError::Spawn {
            program: program.clone(),
            source,
        };
        let capture_err = |source: io::Error| HarnessError::Capture {
            program: program.clone(),
            source,
        };

        // One pipe for both streams keeps the interleaving the child produced.
        let (mut reader, writer) = io::pipe().map_err(spawn_err)?;

        let mut child = {
            let mut cmd = Command::new(invocation.argv.program());
            cmd.args(invocation.argv.arguments())
                .stdout(writer.try_clone().map_err(spawn_err)?)
                .stderr(writer)
                .stdin(if invocation.stdin.is_some() {
                    Stdio::piped()
                } else {
                    Stdio::null()
                });
            if let Some(dir) = &invocation.current_dir {
                cmd.current_dir(dir);
            }
            cmd.spawn().map_err(spawn_err)?
            // `cmd` drops here, closing the parent's write ends so `read_to_end` sees EOF.
        };

        // Feed stdin from its own thread so a chatty child never blocks on a full output pipe.
        let feeder = match (&invocation.stdin, child.stdin.take()) {
            (Some(input), Some(stdin)) => Some(spawn_feeder(stdin, input.clone())),
            _ => None,
        };

        let mut raw = Vec::new();
        reader.read_to_end(&mut raw).map_err(capture_err)?;
        let status = child.wait().map_err(capture_err)?;

        if let Some(feeder) = feeder {
            feeder
                .join()
                .map_err(|_| capture_err(io::Error::other("stdin writer panicked")))?
                .map_err(capture_err)?;
        }

        let result = InvocationResult {
            status: platform::decode_status(status),
            output: String::from_utf8_lossy(&raw).into_owned(),
            command,
        };
        tracing::debug!(status = result.status, output_len = result.output.len(), "invocation finished");
        Ok(result)
    }
}

/// Write `input` and close the pipe. A child that exits without reading its input is not an error: its
/// status and output are what the caller asserts on.
fn spawn_feeder(mut stdin: ChildStdin, input: String) -> thread::JoinHandle<io::Result<()>> {
    thread::spawn(move || match stdin.write_all(input.as_bytes()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_vector_preserves_order() {
        let argv = ArgumentVector::new("rdmd").arg("--force").args(["-m64", "main.d"]);
        assert_eq!(argv.arguments(), ["--force", "-m64", "main.d"]);
        assert_eq!(argv.program(), Path::new("rdmd"));
    }

    #[test]
    fn test_argument_vector_display() {
        let argv = ArgumentVector::new("/usr/bin/rdmd")
            .arg("--compiler=dmd")
            .arg("-m64")
            .path_arg("-of", Path::new("/tmp/out"))
            .arg("main.d");
        insta::assert_snapshot!(argv.to_string(), @"/usr/bin/rdmd --compiler=dmd -m64 -of/tmp/out main.d");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let argv = ArgumentVector::new("/definitely/not/a/real/binary");
        let err = ProcessDriver.run(&argv).unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }
}
