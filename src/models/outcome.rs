//! Execution outcome models
//!
//! Defines per-task outcomes, captured output, and run summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TaskDescriptor;

/// Final outcome of one task. Never revised once reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Process exited on its own; negative codes are terminating signals
    Completed(i32),
    TimedOut,
    MemoryExceeded,
    LaunchError(String),
    InvalidSolver(String),
}

impl ExecutionOutcome {
    /// Short status label
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionOutcome::Completed(_) => "COMPLETED",
            ExecutionOutcome::TimedOut => "TIMEOUT",
            ExecutionOutcome::MemoryExceeded => "MEMOUT",
            ExecutionOutcome::LaunchError(_) => "ERROR",
            ExecutionOutcome::InvalidSolver(_) => "INVALID_SOLVER",
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionOutcome::Completed(code) => Some(*code),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::LaunchError(msg) | ExecutionOutcome::InvalidSolver(msg) => {
                Some(msg)
            }
            _ => None,
        }
    }

    pub fn is_limit_violation(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::TimedOut | ExecutionOutcome::MemoryExceeded
        )
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Completed(code) => write!(f, "{code}"),
            ExecutionOutcome::TimedOut | ExecutionOutcome::MemoryExceeded => {
                write!(f, "{}", self.label())
            }
            ExecutionOutcome::LaunchError(msg) | ExecutionOutcome::InvalidSolver(msg) => {
                write!(f, "{}: {msg}", self.label())
            }
        }
    }
}

/// Raw stdout/stderr of one task
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self { stdout, stderr }
    }

    /// Output carrying only an error message on stderr
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: message.into().into_bytes(),
        }
    }
}

/// Result of one task as reported in the summary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskReport {
    pub task: TaskDescriptor,
    pub outcome: ExecutionOutcome,
    pub duration_ms: u64,
    /// Set when the output could not be persisted
    pub collect_error: Option<String>,
}

impl TaskReport {
    pub const CSV_HEADER: [&'static str; 5] =
        ["task", "status", "exit_code", "duration_ms", "message"];

    pub fn new(task: TaskDescriptor, outcome: ExecutionOutcome, duration_ms: u64) -> Self {
        Self {
            task,
            outcome,
            duration_ms,
            collect_error: None,
        }
    }

    pub fn invalid_solver(task: TaskDescriptor, message: impl Into<String>) -> Self {
        Self::new(task, ExecutionOutcome::InvalidSolver(message.into()), 0)
    }

    pub fn with_collect_error(mut self, error: impl Into<String>) -> Self {
        self.collect_error = Some(error.into());
        self
    }

    /// Fields of this report in `TaskReport::CSV_HEADER` order
    pub fn csv_record(&self) -> [String; 5] {
        [
            self.task.to_string(),
            self.outcome.label().to_string(),
            self.outcome
                .exit_code()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            self.duration_ms.to_string(),
            self.outcome
                .message()
                .or(self.collect_error.as_deref())
                .unwrap_or_default()
                .to_string(),
        ]
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.task, self.outcome)
    }
}

/// Summary of one harness run, in input order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: String,
    pub solver: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total: usize,
    pub completed: usize,
    pub timed_out: usize,
    pub memory_exceeded: usize,
    pub errors: usize,
    pub invalid: usize,
    pub collect_failures: usize,
    pub results: Vec<TaskReport>,
}

impl RunSummary {
    pub fn new(
        solver: impl Into<String>,
        started_at: DateTime<Utc>,
        results: Vec<TaskReport>,
    ) -> Self {
        let count = |pred: fn(&ExecutionOutcome) -> bool| {
            results.iter().filter(|r| pred(&r.outcome)).count()
        };

        let completed = count(|o| matches!(o, ExecutionOutcome::Completed(_)));
        let timed_out = count(|o| matches!(o, ExecutionOutcome::TimedOut));
        let memory_exceeded = count(|o| matches!(o, ExecutionOutcome::MemoryExceeded));
        let errors = count(|o| matches!(o, ExecutionOutcome::LaunchError(_)));
        let invalid = count(|o| matches!(o, ExecutionOutcome::InvalidSolver(_)));
        let collect_failures = results.iter().filter(|r| r.collect_error.is_some()).count();

        Self {
            id: generate_run_id(),
            solver: solver.into(),
            started_at,
            completed_at: Utc::now(),
            total: results.len(),
            completed,
            timed_out,
            memory_exceeded,
            errors,
            invalid,
            collect_failures,
            results,
        }
    }

    /// Tasks that exited with status 0
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == ExecutionOutcome::Completed(0))
            .count()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.results.iter().map(|r| r.duration_ms).sum()
    }

    pub fn wall_time_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary for solver: {}", self.solver)?;
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        Ok(())
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(path: &str, outcome: ExecutionOutcome) -> TaskReport {
        TaskReport::new(TaskDescriptor::new(path), outcome, 10)
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ExecutionOutcome::Completed(0).to_string(), "0");
        assert_eq!(ExecutionOutcome::Completed(-9).to_string(), "-9");
        assert_eq!(ExecutionOutcome::TimedOut.to_string(), "TIMEOUT");
        assert_eq!(ExecutionOutcome::MemoryExceeded.to_string(), "MEMOUT");
        assert_eq!(
            ExecutionOutcome::LaunchError("no such file".into()).to_string(),
            "ERROR: no such file"
        );
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(ExecutionOutcome::TimedOut.is_limit_violation());
        assert!(!ExecutionOutcome::Completed(1).is_limit_violation());
        assert!(!ExecutionOutcome::InvalidSolver("z3".into()).is_limit_violation());
        assert_eq!(ExecutionOutcome::Completed(3).exit_code(), Some(3));
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_string(&ExecutionOutcome::Completed(0)).unwrap();
        assert_eq!(json, r#"{"status":"completed","detail":0}"#);

        let json = serde_json::to_string(&ExecutionOutcome::TimedOut).unwrap();
        assert_eq!(json, r#"{"status":"timed_out"}"#);
    }

    #[test]
    fn test_report_line() {
        let r = report("/bench/a.smt2", ExecutionOutcome::TimedOut);
        assert_eq!(r.to_string(), "/bench/a.smt2 -> TIMEOUT");
    }

    #[test]
    fn test_csv_record_falls_back_to_collect_error() {
        let r = report("/bench/a.smt2", ExecutionOutcome::TimedOut)
            .with_collect_error("disk full");
        assert_eq!(
            r.csv_record(),
            ["/bench/a.smt2", "TIMEOUT", "", "10", "disk full"].map(String::from)
        );

        let r = report("/bench/b.smt2", ExecutionOutcome::Completed(-9));
        assert_eq!(r.csv_record()[2], "-9");
    }

    #[test]
    fn test_run_summary_counts() {
        let results = vec![
            report("/b/1", ExecutionOutcome::Completed(0)),
            report("/b/2", ExecutionOutcome::Completed(1)),
            report("/b/3", ExecutionOutcome::TimedOut),
            report("/b/4", ExecutionOutcome::MemoryExceeded),
            report("/b/5", ExecutionOutcome::LaunchError("x".into())),
            report("/b/6", ExecutionOutcome::InvalidSolver("y".into()))
                .with_collect_error("outside root"),
        ];

        let summary = RunSummary::new("duper", Utc::now(), results);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.memory_exceeded, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.collect_failures, 1);
        assert_eq!(summary.total_duration_ms(), 60);
    }

    #[test]
    fn test_summary_display_keeps_order() {
        let results = vec![
            report("/b/z", ExecutionOutcome::Completed(0)),
            report("/b/a", ExecutionOutcome::TimedOut),
        ];
        let summary = RunSummary::new("duper", Utc::now(), results);
        let text = summary.to_string();
        assert_eq!(
            text,
            "Summary for solver: duper\n/b/z -> 0\n/b/a -> TIMEOUT\n"
        );
    }
}
