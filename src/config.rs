//! Harness configuration.
//!
//! Built once from the command line and passed by reference to every component; nothing reads the compiler
//! choice or tool path from global state.

use std::env;
use std::path::{Path, PathBuf};

use crate::driver::ArgumentVector;
use crate::error::HarnessError;
use crate::platform;

pub const DEFAULT_COMPILER: &str = "dmd";
pub const DEFAULT_MODEL: &str = "64";

/// Settings for the optional concurrency stress run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressConfig {
    pub workers: usize,
    pub iterations: usize,
    /// `None` draws a fresh seed; the chosen value is always reported.
    pub seed: Option<u64>,
}

impl StressConfig {
    pub const DEFAULT_ITERATIONS: usize = 16;

    pub fn default_workers() -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            workers: Self::default_workers(),
            iterations: Self::DEFAULT_ITERATIONS,
            seed: None,
        }
    }
}

/// Immutable configuration for one harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    tool: PathBuf,
    compiler: String,
    model: String,
    pub fail_fast: bool,
    pub stress: Option<StressConfig>,
}

impl HarnessConfig {
    /// Resolve `tool` to an absolute path and verify it exists.
    pub fn new(tool: &Path, compiler: impl Into<String>, model: impl Into<String>) -> Result<Self, HarnessError> {
        let absolute = if tool.is_absolute() {
            tool.to_path_buf()
        } else {
            env::current_dir()
                .map_err(|_| HarnessError::ToolNotFound {
                    path: tool.to_path_buf(),
                })?
                .join(tool)
        };
        if !absolute.is_file() {
            return Err(HarnessError::ToolNotFound { path: absolute });
        }
        Ok(Self {
            tool: absolute,
            compiler: compiler.into(),
            model: model.into(),
            fail_fast: false,
            stress: None,
        })
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// The `-m<model>` switch forwarded to the compiler.
    pub fn model_switch(&self) -> String {
        format!("-m{}", self.model)
    }

    /// Tool invocation with the configured compiler and model; every battery scenario starts here.
    pub fn tool_args(&self) -> ArgumentVector {
        ArgumentVector::new(&self.tool)
            .arg(format!("--compiler={}", self.compiler))
            .arg(self.model_switch())
    }

    /// Tool invocation with only the model switch (no compiler selection).
    pub fn bare_tool_args(&self) -> ArgumentVector {
        ArgumentVector::new(&self.tool).arg(self.model_switch())
    }

    /// Direct compiler invocation, for prebuilding dependency objects.
    pub fn compiler_args(&self) -> ArgumentVector {
        ArgumentVector::new(&self.compiler).arg(self.model_switch())
    }

    /// Full path of the configured compiler found on `PATH`, when it differs from the configured spelling.
    pub fn compiler_full_path(&self) -> Option<PathBuf> {
        let configured = Path::new(&self.compiler);
        if configured.components().count() > 1 {
            return None;
        }
        let file_name = format!("{}{}", self.compiler, platform::EXE_SUFFIX);
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var)
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
            .filter(|candidate| candidate.as_path() != configured)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config_for_current_exe() -> HarnessConfig {
        let exe = env::current_exe().unwrap();
        HarnessConfig::new(&exe, "ldmd2", "32").unwrap()
    }

    #[test]
    fn test_missing_tool_is_setup_error() {
        let err = HarnessConfig::new(Path::new("/no/such/rdmd"), DEFAULT_COMPILER, DEFAULT_MODEL).unwrap_err();
        assert!(matches!(err, HarnessError::ToolNotFound { .. }));
    }

    #[test]
    fn test_tool_args_always_select_compiler() {
        let config = config_for_current_exe();
        let argv = config.tool_args().arg("main.d");
        assert_eq!(argv.arguments(), ["--compiler=ldmd2", "-m32", "main.d"]);
        assert!(argv.program().is_absolute());
    }

    #[test]
    fn test_bare_and_compiler_args() {
        let config = config_for_current_exe();
        assert_eq!(config.bare_tool_args().arguments(), ["-m32"]);
        assert_eq!(config.compiler_args().program(), Path::new("ldmd2"));
    }

    #[test]
    fn test_compiler_with_directory_has_no_alternate_spelling() {
        let mut config = config_for_current_exe();
        config.compiler = "/opt/dmd/bin/dmd".to_string();
        assert_eq!(config.compiler_full_path(), None);
    }

    #[test]
    fn test_default_stress_config() {
        let stress = StressConfig::default();
        assert!(stress.workers >= 1);
        assert_eq!(stress.iterations, StressConfig::DEFAULT_ITERATIONS);
        assert_eq!(stress.seed, None);
    }
}
