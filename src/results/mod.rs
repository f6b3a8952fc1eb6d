//! Results module
//!
//! Per-task output persistence and run summary export.

mod collector;
mod storage;

pub use collector::ResultCollector;
pub use storage::{ExportFormat, StoredRun};
