//! Per-task output persistence
//!
//! Writes captured stdout/stderr under
//! `<output_dir>/<solver>/<path relative to benchmark root>.{stdout,stderr}`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::models::{CapturedOutput, TaskDescriptor};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("{task} is not under benchmark root {root}")]
    OutsideBenchmarkRoot { task: PathBuf, root: PathBuf },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stores task output in the on-disk result layout
#[derive(Clone, Debug)]
pub struct ResultCollector {
    output_dir: PathBuf,
    benchmark_root: PathBuf,
}

impl ResultCollector {
    pub fn new(output_dir: impl Into<PathBuf>, benchmark_root: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            benchmark_root: benchmark_root.into(),
        }
    }

    /// Directory holding all results of one solver
    pub fn solver_dir(&self, solver: &str) -> PathBuf {
        self.output_dir.join(solver)
    }

    /// The `.stdout` and `.stderr` paths for a task
    pub fn output_paths(
        &self,
        solver: &str,
        task: &TaskDescriptor,
    ) -> Result<(PathBuf, PathBuf), CollectError> {
        let relative =
            task.relative_to(&self.benchmark_root)
                .ok_or_else(|| CollectError::OutsideBenchmarkRoot {
                    task: task.path().to_path_buf(),
                    root: self.benchmark_root.clone(),
                })?;

        let base = self.solver_dir(solver).join(relative);
        Ok((with_suffix(&base, ".stdout"), with_suffix(&base, ".stderr")))
    }

    /// Write both output files, creating parent directories first.
    /// Returns the stdout path.
    pub async fn persist(
        &self,
        solver: &str,
        task: &TaskDescriptor,
        output: &CapturedOutput,
    ) -> Result<PathBuf, CollectError> {
        let (stdout_path, stderr_path) = self.output_paths(solver, task)?;

        if let Some(parent) = stdout_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CollectError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        write(&stdout_path, &output.stdout).await?;
        write(&stderr_path, &output.stderr).await?;

        debug!("Stored output for {} in {}", task, stdout_path.display());
        Ok(stdout_path)
    }
}

/// Append a suffix to the full file name (`foo.smt2` -> `foo.smt2.stdout`)
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

async fn write(path: &Path, bytes: &[u8]) -> Result<(), CollectError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| CollectError::Io {
            path: path.to_path_buf(),
            source,
        })
}
