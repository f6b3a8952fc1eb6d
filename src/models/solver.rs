//! Solver models
//!
//! Defines the closed set of solver pipelines the harness knows how to launch.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use super::TaskDescriptor;

/// Supported solver pipelines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SolverKind {
    #[serde(rename = "duper")]
    Duper,
    #[serde(rename = "cvc5+leansmt")]
    Cvc5LeanSmt,
    #[serde(rename = "cvc5+ethos")]
    Cvc5Ethos,
    #[serde(rename = "verit+sledgehammer")]
    VeritSledgehammer,
    #[serde(rename = "verit+smtcoq")]
    VeritSmtCoq,
}

impl SolverKind {
    /// Canonical name, used on the command line and as the output subdirectory
    pub fn name(&self) -> &'static str {
        match self {
            SolverKind::Duper => "duper",
            SolverKind::Cvc5LeanSmt => "cvc5+leansmt",
            SolverKind::Cvc5Ethos => "cvc5+ethos",
            SolverKind::VeritSledgehammer => "verit+sledgehammer",
            SolverKind::VeritSmtCoq => "verit+smtcoq",
        }
    }

    /// Short human description
    pub fn description(&self) -> &'static str {
        match self {
            SolverKind::Duper => "Duper superposition prover (Lean)",
            SolverKind::Cvc5LeanSmt => "cvc5 proofs reconstructed by lean-smt",
            SolverKind::Cvc5Ethos => "cvc5 proofs checked by Ethos",
            SolverKind::VeritSledgehammer => "veriT proofs replayed by Isabelle/Sledgehammer",
            SolverKind::VeritSmtCoq => "veriT proofs checked by SMTCoq",
        }
    }

    /// Default wrapper script file name
    pub fn script_name(&self) -> String {
        format!("{}.sh", self.name())
    }

    /// Whether the wrapper also receives the run's output root
    pub fn takes_output_dir(&self) -> bool {
        matches!(self, SolverKind::VeritSledgehammer)
    }

    /// Build the argument vector for one task
    pub fn build_args(&self, task: &TaskDescriptor, output_dir: &Path) -> Vec<OsString> {
        match self {
            SolverKind::VeritSledgehammer => vec![
                output_dir.as_os_str().to_os_string(),
                task.path().as_os_str().to_os_string(),
            ],
            SolverKind::Duper
            | SolverKind::Cvc5LeanSmt
            | SolverKind::Cvc5Ethos
            | SolverKind::VeritSmtCoq => vec![task.path().as_os_str().to_os_string()],
        }
    }

    pub fn all() -> Vec<SolverKind> {
        vec![
            SolverKind::Duper,
            SolverKind::Cvc5LeanSmt,
            SolverKind::Cvc5Ethos,
            SolverKind::VeritSledgehammer,
            SolverKind::VeritSmtCoq,
        ]
    }

    /// Parse from the canonical name
    pub fn from_str(s: &str) -> Option<SolverKind> {
        Self::all().into_iter().find(|kind| kind.name() == s)
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Concrete command to launch for one task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_names_round_trip() {
        for kind in SolverKind::all() {
            assert_eq!(SolverKind::from_str(kind.name()), Some(kind));
        }
        assert_eq!(SolverKind::from_str("z3"), None);
        assert_eq!(SolverKind::from_str("DUPER"), None);
    }

    #[test]
    fn test_only_sledgehammer_takes_output_dir() {
        let with_dir: Vec<_> = SolverKind::all()
            .into_iter()
            .filter(|k| k.takes_output_dir())
            .collect();
        assert_eq!(with_dir, vec![SolverKind::VeritSledgehammer]);
    }

    #[test]
    fn test_build_args() {
        let task = TaskDescriptor::new("/bench/QF_UF/a.smt2");
        let out = Path::new("/out");

        assert_eq!(
            SolverKind::Duper.build_args(&task, out),
            vec![OsString::from("/bench/QF_UF/a.smt2")]
        );
        assert_eq!(
            SolverKind::VeritSledgehammer.build_args(&task, out),
            vec![OsString::from("/out"), OsString::from("/bench/QF_UF/a.smt2")]
        );
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&SolverKind::Cvc5Ethos).unwrap();
        assert_eq!(json, "\"cvc5+ethos\"");
    }

    #[test]
    fn test_command_line_display() {
        let cmd = CommandLine::new("/opt/duper.sh").args(["/bench/a.smt2"]);
        assert_eq!(cmd.to_string(), "/opt/duper.sh /bench/a.smt2");
    }
}
