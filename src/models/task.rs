//! Benchmark task identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A single benchmark to run, identified by its absolute path
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDescriptor {
    path: PathBuf,
}

impl TaskDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of this task relative to the benchmark root, if it lives under it
    pub fn relative_to(&self, root: &Path) -> Option<&Path> {
        self.path
            .strip_prefix(root)
            .ok()
            .filter(|rel| rel.file_name().is_some())
            .filter(|rel| rel.components().all(|c| matches!(c, Component::Normal(_))))
    }
}

impl fmt::Display for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
