//! Data models for the benchmark harness
//!
//! This module contains all data structures used throughout the application.

mod outcome;
mod solver;
mod task;

pub use outcome::{CapturedOutput, ExecutionOutcome, RunSummary, TaskReport};
pub use solver::{CommandLine, SolverKind};
pub use task::TaskDescriptor;
