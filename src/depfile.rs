//! Make-style dependency listing checks (`--makedepend` / `--makedepfile=`).
//!
//! Expected shape:
//!
//! ```text
//! /tmp/x/depMod_: \
//!  /tmp/x/depMod_.d \
//!  /tmp/x/dsubpack/submod.d
//!
//! /tmp/x/dsubpack/submod.d:
//! ```
//!
//! The target line ends in a continuation marker, each prerequisite sits on its own continued line, every
//! non-root prerequisite later gets an empty rule of its own, and a continuation marker is never followed by
//! a blank line.

use std::path::{Path, PathBuf};

const CONTINUATION: &str = " \\";

/// What a listing for one target must mention.
#[derive(Debug, Clone)]
pub struct DependencyExpectation {
    pub target: PathBuf,
    pub target_source: PathBuf,
    pub dependencies: Vec<PathBuf>,
}

impl DependencyExpectation {
    pub fn new(target: impl Into<PathBuf>, target_source: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            target_source: target_source.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn dependency(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependencies.push(path.into());
        self
    }
}

/// A listing split into newline-normalized lines.
#[derive(Debug, Clone)]
pub struct DependencyListing {
    lines: Vec<String>,
}

impl DependencyListing {
    pub fn parse(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        Self {
            lines: normalized.split('\n').map(str::to_string).collect(),
        }
    }

    fn has_line(&self, expected: &str) -> bool {
        self.lines.iter().any(|line| line == expected)
    }

    /// A continued prerequisite line, with or without its own trailing marker.
    fn has_prerequisite(&self, path: &str) -> bool {
        let bare = format!(" {path}");
        let continued = format!("{bare}{CONTINUATION}");
        self.lines.iter().any(|line| *line == bare || *line == continued)
    }

    /// Indices of lines ending in a continuation marker that are followed by a blank line (or nothing).
    fn dangling_continuations(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.ends_with('\\'))
            .filter(|(idx, _)| self.lines.get(idx + 1).is_none_or(|next| next.trim().is_empty()))
            .map(|(idx, _)| idx + 1)
            .collect()
    }

    /// Every rule violated by this listing; empty means well-formed.
    pub fn check(&self, expectation: &DependencyExpectation) -> Vec<String> {
        let mut violations = Vec::new();

        let target_line = format!("{}:{CONTINUATION}", display(&expectation.target));
        if !self.has_line(&target_line) {
            violations.push(format!("missing target line {target_line:?}"));
        }

        let source_line = format!(" {}{CONTINUATION}", display(&expectation.target_source));
        if !self.has_line(&source_line) {
            violations.push(format!("missing continued source line {source_line:?}"));
        }

        for dep in &expectation.dependencies {
            let dep = display(dep);
            if !self.has_prerequisite(&dep) {
                violations.push(format!("missing prerequisite line {:?}", format!(" {dep}")));
            }
            let rule = format!("{dep}:");
            if !self.has_line(&rule) {
                violations.push(format!("missing empty rule {rule:?}"));
            }
        }

        for line_no in self.dangling_continuations() {
            violations.push(format!("continuation on line {line_no} is followed by an empty line"));
        }

        violations
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Tests
// ============================================================================
