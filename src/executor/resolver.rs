//! Solver command resolution
//!
//! Maps a solver name and a task to the concrete command line to launch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::HarnessConfig;
use crate::models::{CommandLine, SolverKind, TaskDescriptor};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Solver {0} is not recognized.")]
    UnknownSolver(String),
}

/// Turns a (solver, task) pair into a command line. Implementations must be
/// pure: no I/O, no blocking.
pub trait ResolveCommand: Send + Sync {
    fn resolve(
        &self,
        solver: &str,
        task: &TaskDescriptor,
        output_dir: &Path,
    ) -> Result<CommandLine, ResolveError>;
}

/// Resolver backed by the configured wrapper scripts
#[derive(Clone, Debug)]
pub struct CommandResolver {
    scripts: BTreeMap<SolverKind, PathBuf>,
}

impl CommandResolver {
    pub fn new(scripts: BTreeMap<SolverKind, PathBuf>) -> Self {
        Self { scripts }
    }

    /// One script per known solver, taken from configuration
    pub fn from_config(config: &HarnessConfig) -> Self {
        let scripts = SolverKind::all()
            .into_iter()
            .map(|kind| (kind, config.script_for(kind)))
            .collect();
        Self::new(scripts)
    }

    pub fn script(&self, kind: SolverKind) -> Option<&Path> {
        self.scripts.get(&kind).map(PathBuf::as_path)
    }
}

impl ResolveCommand for CommandResolver {
    fn resolve(
        &self,
        solver: &str,
        task: &TaskDescriptor,
        output_dir: &Path,
    ) -> Result<CommandLine, ResolveError> {
        let kind = SolverKind::from_str(solver)
            .ok_or_else(|| ResolveError::UnknownSolver(solver.to_string()))?;
        let script = self
            .script(kind)
            .ok_or_else(|| ResolveError::UnknownSolver(solver.to_string()))?;

        Ok(CommandLine::new(script).args(kind.build_args(task, output_dir)))
    }
}
