//! Configuration module
//!
//! Handles loading and managing harness configuration.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::SolverKind;

/// Fatal configuration errors. Any of these aborts the run before a task starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Task list not found: {0}")]
    MissingTaskList(PathBuf),

    #[error("Failed to read task list {path}: {source}")]
    UnreadableTaskList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    #[error("Output directory {path} is not writable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Harness configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the `<solver>.sh` wrapper scripts
    pub script_dir: PathBuf,

    /// Per-solver script overrides, keyed by solver name
    pub solver_scripts: BTreeMap<String, PathBuf>,

    /// Base directory all benchmarks live under
    pub benchmark_root: PathBuf,

    /// Root directory for solver output
    pub output_dir: PathBuf,

    /// Number of benchmarks to run in parallel
    pub jobs: usize,

    /// Wall-clock limit per benchmark in seconds
    pub timeout_secs: u64,

    /// Memory limit per benchmark in MB
    pub memout_mb: u64,

    /// Memory sampling interval in milliseconds
    pub sample_interval_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from("/home/user/artifact"),
            solver_scripts: BTreeMap::new(),
            benchmark_root: PathBuf::from("/home/user/artifact/benchmarks"),
            output_dir: PathBuf::from("/home/user/artifact/output"),
            jobs: 1,
            timeout_secs: 60,
            memout_mb: 1024,
            sample_interval_ms: 5000,
        }
    }
}

impl HarnessConfig {
    /// Wrapper script for a solver, honouring overrides
    pub fn script_for(&self, kind: SolverKind) -> PathBuf {
        self.solver_scripts
            .get(kind.name())
            .cloned()
            .unwrap_or_else(|| self.script_dir.join(kind.script_name()))
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn memory_cap_bytes(&self) -> u64 {
        self.memout_mb.saturating_mul(1024 * 1024)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Apply environment overrides on top of this config
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(jobs) = env.jobs {
            self.jobs = jobs;
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(memout) = env.memout {
            self.memout_mb = memout;
        }
        if let Some(dir) = &env.output_dir {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(root) = &env.benchmark_root {
            self.benchmark_root = PathBuf::from(root);
        }
        if let Some(dir) = &env.script_dir {
            self.script_dir = PathBuf::from(dir);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sample_interval_ms must be at least 1".to_string(),
            ));
        }
        for name in self.solver_scripts.keys() {
            if SolverKind::from_str(name).is_none() {
                return Err(ConfigError::UnknownSolver(name.clone()));
            }
        }
        Ok(())
    }

    /// Create the output root and check that files can be written into it
    pub fn ensure_output_dir(&self) -> Result<(), ConfigError> {
        ensure_writable_dir(&self.output_dir)
    }
}

/// Marker written and removed again by `ensure_writable_dir`
const WRITE_CHECK_FILE: &str = ".solver-bench-write-check";

fn ensure_writable_dir(path: &Path) -> Result<(), ConfigError> {
    let to_error = |source| ConfigError::OutputDir {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(path).map_err(to_error)?;
    // An existing directory passes create_dir_all even when read-only.
    let marker = path.join(WRITE_CHECK_FILE);
    std::fs::write(&marker, b"").map_err(to_error)?;
    std::fs::remove_file(&marker).map_err(to_error)
}

#[cfg(test)]
impl HarnessConfig {
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_limits(mut self, timeout_secs: u64, memout_mb: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.memout_mb = memout_mb;
        self
    }
}
