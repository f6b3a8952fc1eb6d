//! Run summary export
//!
//! Writes a finished run, together with the limits it ran under, as JSON or CSV.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::config::HarnessConfig;
use crate::models::{RunSummary, TaskReport};

/// Exported run: the summary plus how it was produced
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    pub summary: RunSummary,

    /// Limits and paths used for the run
    pub config: RunConfig,

    /// Host the run executed on
    pub environment: EnvironmentInfo,
}

/// Run parameters recorded alongside the results
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub jobs: usize,
    pub timeout_secs: u64,
    pub memout_mb: u64,
    pub sample_interval_ms: u64,
    pub output_dir: String,
    pub benchmark_root: String,
}

/// Environment information
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Operating system
    pub os: String,

    /// Architecture
    pub arch: String,

    /// Tool version
    pub tool_version: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl From<&HarnessConfig> for RunConfig {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            jobs: config.jobs,
            timeout_secs: config.timeout_secs,
            memout_mb: config.memout_mb,
            sample_interval_ms: config.sample_interval_ms,
            output_dir: config.output_dir.display().to_string(),
            benchmark_root: config.benchmark_root.display().to_string(),
        }
    }
}

impl StoredRun {
    pub fn new(summary: RunSummary, config: &HarnessConfig) -> Self {
        Self {
            summary,
            config: RunConfig::from(config),
            environment: EnvironmentInfo::default(),
        }
    }

    /// Export the run, creating the parent directory if needed
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        match format {
            ExportFormat::Json => {
                let file = File::create(path).context("Failed to create export file")?;
                let writer = BufWriter::new(file);
                serde_json::to_writer_pretty(writer, self).context("Failed to write results")?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;

                let mut header = vec!["run_id", "solver"];
                header.extend(TaskReport::CSV_HEADER);
                writer.write_record(&header)?;

                for report in &self.summary.results {
                    let mut row = vec![self.summary.id.clone(), self.summary.solver.clone()];
                    row.extend(report.csv_record());
                    writer.write_record(&row)?;
                }
                writer.flush()?;
            }
        }

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// Export format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionOutcome, TaskDescriptor};
    use chrono::Utc;
    use tempfile::tempdir;

    fn stored_run() -> StoredRun {
        let results = vec![
            TaskReport::new(
                TaskDescriptor::new("/bench/a.smt2"),
                ExecutionOutcome::Completed(1),
                42,
            ),
            TaskReport::new(
                TaskDescriptor::new("/bench/b.smt2"),
                ExecutionOutcome::LaunchError("No such file or directory".into()),
                3,
            ),
        ];
        let summary = RunSummary::new("duper", Utc::now(), results);
        StoredRun::new(summary, &HarnessConfig::default().with_jobs(8))
    }

    #[test]
    fn test_export_format() {
        assert_eq!(ExportFormat::from_str("JSON"), Some(ExportFormat::Json));
        assert_eq!(
            ExportFormat::from_extension(Path::new("out/run.csv")),
            Some(ExportFormat::Csv)
        );
        assert!(ExportFormat::from_extension(Path::new("run.txt")).is_none());
        assert!(ExportFormat::from_extension(Path::new("run")).is_none());
    }

    #[test]
    fn test_json_export_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/run.json");
        let run = stored_run();

        run.export(&path, ExportFormat::Json).unwrap();
        let file = File::open(&path).unwrap();
        let loaded: StoredRun = serde_json::from_reader(file).unwrap();

        assert_eq!(loaded.summary.id, run.summary.id);
        assert_eq!(loaded.summary.results.len(), 2);
        assert_eq!(loaded.config.jobs, 8);
        assert_eq!(loaded.environment.tool_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_csv_export_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.csv");
        stored_run().export(&path, ExportFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "/bench/a.smt2");
        assert_eq!(&rows[0][3], "COMPLETED");
        assert_eq!(&rows[0][4], "1");
        assert_eq!(&rows[1][3], "ERROR");
        assert_eq!(&rows[1][6], "No such file or directory");
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["run_id", "solver", "task", "status", "exit_code", "duration_ms", "message"]
        );
    }
}
