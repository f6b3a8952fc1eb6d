//! Benchmark execution engine
//!
//! Reads tasks, resolves solver commands, and runs them under resource
//! limits with bounded parallelism.

mod monitor;
mod parallel;
mod process_tree;
mod resolver;
mod source;
mod supervisor;

pub use parallel::WorkerPool;
pub use resolver::{CommandResolver, ResolveCommand};
pub use source::TaskSource;
pub use supervisor::Limits;
