//! Output formatters for run summaries
//!
//! Provides the plain summary listing plus table, JSON and CSV renderings.

use crate::models::{ExecutionOutcome, RunSummary, TaskReport};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn outcome_cell(&self, outcome: &ExecutionOutcome) -> String {
        let text = match outcome {
            ExecutionOutcome::Completed(code) => format!("exit {code}"),
            other => other.label().to_string(),
        };
        if !self.colorize {
            return text;
        }

        let color = match outcome {
            ExecutionOutcome::Completed(0) => "32",
            ExecutionOutcome::Completed(_) => "33",
            o if o.is_limit_violation() => "35",
            _ => "31",
        };
        // Pad before coloring so escape codes do not break alignment.
        format!("\x1b[{color}m{text:14}\x1b[0m")
    }

    fn format_report_table(&self, report: &TaskReport) -> String {
        let mut line = format!(
            "{:14} {:>9}ms  {}",
            self.outcome_cell(&report.outcome),
            report.duration_ms,
            report.task
        );
        if let Some(error) = &report.collect_error {
            line.push_str(&format!("  (not stored: {error})"));
        }
        line
    }

    /// Format a whole run
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.format_summary_csv(summary),
            OutputFormat::Summary => summary.to_string(),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " Solver: {} (run {})\n",
            summary.solver, summary.id
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        for report in &summary.results {
            output.push_str(&format!(" {}\n", self.format_report_table(report)));
        }

        output.push_str(" ───────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            " Total: {} | Completed: {} (exit 0: {}) | Timeout: {} | Memout: {}\n",
            summary.total,
            summary.completed,
            summary.succeeded(),
            summary.timed_out,
            summary.memory_exceeded
        ));
        output.push_str(&format!(
            " Errors: {} | Invalid: {} | Not stored: {}\n",
            summary.errors, summary.invalid, summary.collect_failures
        ));
        output.push_str(&format!(
            " Wall time: {}ms | Summed task time: {}ms\n",
            summary.wall_time_ms(),
            summary.total_duration_ms()
        ));

        output
    }

    fn format_summary_csv(&self, summary: &RunSummary) -> String {
        write_csv(summary)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

fn write_csv(summary: &RunSummary) -> csv::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TaskReport::CSV_HEADER)?;
    for report in &summary.results {
        writer.write_record(report.csv_record())?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Summary)
    }
}
