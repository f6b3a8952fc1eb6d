//! Task list input
//!
//! Reads the ordered list of benchmark paths to run.

use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::config::ConfigError;
use crate::models::TaskDescriptor;

/// Reads task identifiers from a list file, one path per line
pub struct TaskSource;

impl TaskSource {
    /// Read all tasks in file order. Blank lines are skipped; paths are not
    /// checked for existence here.
    pub fn read(path: impl AsRef<Path>) -> Result<Vec<TaskDescriptor>, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ConfigError::MissingTaskList(path.to_path_buf())
            } else {
                ConfigError::UnreadableTaskList {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let tasks = Self::parse(&content);
        debug!("Read {} tasks from {}", tasks.len(), path.display());
        Ok(tasks)
    }

    pub fn parse(content: &str) -> Vec<TaskDescriptor> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(TaskDescriptor::new)
            .collect()
    }
}
