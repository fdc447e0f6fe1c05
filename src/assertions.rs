//! Assertion layer.
//!
//! Each check returns `Result<(), AssertionFailure>` so scenario bodies read as a sequence of `?`-terminated
//! expectations. A failure carries the offending command and its captured output verbatim.

use std::fmt;
use std::path::Path;

use crate::depfile::{DependencyExpectation, DependencyListing};
use crate::driver::InvocationResult;

/// A violated expectation about the tool's behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub message: String,
    /// Rendered argv of the invocation under test (empty for filesystem-only checks).
    pub command: String,
    pub status: Option<i32>,
    /// Captured output, unmodified.
    pub output: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>, result: &InvocationResult) -> Self {
        Self {
            message: message.into(),
            command: result.command.clone(),
            status: Some(result.status),
            output: result.output.clone(),
        }
    }

    /// Failure without an invocation attached (e.g. a missing artifact).
    pub fn standalone(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: String::new(),
            status: None,
            output: String::new(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.command.is_empty() {
            write!(f, "\n  command: {}", self.command)?;
        }
        if let Some(status) = self.status {
            write!(f, "\n  status: {status}")?;
        }
        if !self.output.is_empty() {
            write!(f, "\n  --- captured output ---\n{}", self.output)?;
            if !self.output.ends_with('\n') {
                writeln!(f)?;
            }
            write!(f, "  --- end of output ---")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailure {}

pub type Expectation = Result<(), AssertionFailure>;

pub fn expect(condition: bool, message: impl Into<String>, result: &InvocationResult) -> Expectation {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message, result))
    }
}

pub fn expect_status(result: &InvocationResult, expected: i32) -> Expectation {
    expect(
        result.status == expected,
        format!("expected exit status {expected}, got {}", result.status),
        result,
    )
}

/// Any nonzero status, including signal deaths.
pub fn expect_failure(result: &InvocationResult, why: &str) -> Expectation {
    expect(result.status != 0, format!("expected a failing exit status: {why}"), result)
}

pub fn expect_contains(result: &InvocationResult, needle: &str) -> Expectation {
    expect(
        result.output.contains(needle),
        format!("expected output to contain {needle:?}"),
        result,
    )
}

pub fn expect_not_contains(result: &InvocationResult, needle: &str) -> Expectation {
    expect(
        !result.output.contains(needle),
        format!("expected output not to contain {needle:?}"),
        result,
    )
}

pub fn expect_path_exists(path: &Path, why: &str) -> Expectation {
    if path.exists() {
        Ok(())
    } else {
        Err(AssertionFailure::standalone(format!(
            "expected '{}' to exist: {why}",
            path.display()
        )))
    }
}

pub fn expect_path_absent(path: &Path, why: &str) -> Expectation {
    if path.exists() {
        Err(AssertionFailure::standalone(format!(
            "expected '{}' not to exist: {why}",
            path.display()
        )))
    } else {
        Ok(())
    }
}

/// Validate a dependency listing that may have come from stdout or from a file.
///
/// `result` is used for context only; pass the invocation that produced the listing.
pub fn expect_dependency_listing(
    listing: &str,
    expectation: &DependencyExpectation,
    result: &InvocationResult,
) -> Expectation {
    let violations = DependencyListing::parse(listing).check(expectation);
    if violations.is_empty() {
        return Ok(());
    }
    let mut failure = AssertionFailure::new(
        format!("malformed dependency listing: {}", violations.join("; ")),
        result,
    );
    if failure.output != listing {
        failure.output = format!("{}\n--- listing ---\n{listing}", failure.output);
    }
    Err(failure)
}
