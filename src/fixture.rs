//! Fixture manager: isolated temporary files and directories.
//!
//! Every run gets one root directory. Each scenario works inside its own sub-directory ([`ScenarioScope`]), so
//! two scenarios can both create `dsubpack/submod.d` without colliding. Paths are claimed once per run; a
//! second claim is a setup error rather than a silent overwrite.
//!
//! Cleanup is tied to `Drop`, so it runs whether the scenario passes, fails, or unwinds.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::error::HarnessError;

/// Directory holding fixtures shared across the order-dependent cache scenarios.
const SHARED_DIR: &str = "shared";

type Claims = Arc<Mutex<HashSet<PathBuf>>>;

/// Owns the run root and the set of claimed fixture paths.
pub struct FixtureManager {
    root: TempDir,
    root_path: PathBuf,
    claims: Claims,
}

impl FixtureManager {
    /// Create a fresh run root under the system temp directory.
    pub fn new() -> Result<Self, HarnessError> {
        let root = tempfile::Builder::new()
            .prefix("rdmd-harness-")
            .tempdir()
            .map_err(|e| HarnessError::fixture(std::env::temp_dir(), e))?;
        let root_path = canonical_root(root.path())?;
        tracing::debug!(root = %root_path.display(), "fixture root created");
        Ok(Self {
            root,
            root_path,
            claims: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Directory for fixtures that outlive a single scenario.
    pub fn shared_dir(&self) -> PathBuf {
        self.root_path.join(SHARED_DIR)
    }

    /// Open the private working directory for one scenario.
    pub fn scope(&self, scenario: &str) -> Result<ScenarioScope, HarnessError> {
        let dir = self.root_path.join(scenario);
        claim(&self.claims, &dir)?;
        remove_existing(&dir)?;
        fs::create_dir_all(&dir).map_err(|e| HarnessError::fixture(&dir, e))?;
        Ok(ScenarioScope {
            dir,
            claims: Arc::clone(&self.claims),
        })
    }

    /// Create a run-scoped file under the shared directory.
    pub fn shared_file(&self, name: &str, content: &str) -> Result<Fixture, HarnessError> {
        create_file(&self.claims, &self.shared_dir().join(name), content)
    }

    /// Create a file at an absolute path (or one relative to the root).
    pub fn file(&self, path: impl AsRef<Path>, content: &str) -> Result<Fixture, HarnessError> {
        create_file(&self.claims, &self.root_path.join(path), content)
    }

    /// Create an empty directory at an absolute path (or one relative to the root).
    pub fn dir(&self, path: impl AsRef<Path>) -> Result<Fixture, HarnessError> {
        create_dir(&self.claims, &self.root_path.join(path))
    }

    /// Remove the run root now, reporting any error instead of swallowing it in `Drop`.
    pub fn close(self) -> Result<(), HarnessError> {
        let path = self.root_path.clone();
        self.root.close().map_err(|e| HarnessError::fixture(path, e))
    }
}

/// A scenario's private directory; removed recursively on drop.
pub struct ScenarioScope {
    dir: PathBuf,
    claims: Claims,
}

impl ScenarioScope {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path inside the scope without creating anything.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.join(relative)
    }

    pub fn file(&self, relative: impl AsRef<Path>, content: &str) -> Result<Fixture, HarnessError> {
        create_file(&self.claims, &self.dir.join(relative), content)
    }

    pub fn dir(&self, relative: impl AsRef<Path>) -> Result<Fixture, HarnessError> {
        create_dir(&self.claims, &self.dir.join(relative))
    }
}

impl Drop for ScenarioScope {
    fn drop(&mut self) {
        if let Err(e) = remove_existing(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to remove scenario directory");
        }
    }
}

/// One created file or directory; removed on drop unless released.
#[derive(Debug)]
pub struct Fixture {
    path: PathBuf,
    armed: bool,
}

impl Fixture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the path on disk after this handle drops.
    pub fn release(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = remove_existing(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove fixture");
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn claim(claims: &Claims, path: &Path) -> Result<(), HarnessError> {
    let mut claimed = claims.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if !claimed.insert(path.to_path_buf()) {
        return Err(HarnessError::FixtureCollision {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn create_file(claims: &Claims, path: &Path, content: &str) -> Result<Fixture, HarnessError> {
    claim(claims, path)?;
    remove_existing(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| HarnessError::fixture(parent, e))?;
    }
    fs::write(path, content).map_err(|e| HarnessError::fixture(path, e))?;
    Ok(Fixture {
        path: path.to_path_buf(),
        armed: true,
    })
}

fn create_dir(claims: &Claims, path: &Path) -> Result<Fixture, HarnessError> {
    claim(claims, path)?;
    remove_existing(path)?;
    fs::create_dir_all(path).map_err(|e| HarnessError::fixture(path, e))?;
    Ok(Fixture {
        path: path.to_path_buf(),
        armed: true,
    })
}

/// Remove whatever sits at `path`, file or directory. Missing paths are fine.
fn remove_existing(path: &Path) -> Result<(), HarnessError> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|e| HarnessError::fixture(path, e))
}

// The tool echoes absolute paths back (makedepend output, diagnostics); resolve symlinked temp dirs such as
// macOS `/var -> /private/var` so they compare equal. Windows canonical paths carry a `\\?\` prefix the tool
// never prints, so the root is left as-is there.
#[cfg(not(windows))]
fn canonical_root(path: &Path) -> Result<PathBuf, HarnessError> {
    fs::canonicalize(path).map_err(|e| HarnessError::fixture(path, e))
}

#[cfg(windows)]
fn canonical_root(path: &Path) -> Result<PathBuf, HarnessError> {
    Ok(path.to_path_buf())
}

// ============================================================================
// Tests
// ============================================================================
