//! solver-bench - benchmark harness for proof-producing SMT solvers
//!
//! Runs one solver over a list of benchmark files, each under a wall-clock
//! and memory limit, and stores every run's stdout/stderr in a layout that
//! mirrors the benchmark tree.
//!
//! ## Usage
//!
//! ```bash
//! # Run cvc5 with Ethos checking on 8 cores, 5 minutes and 4GB per benchmark
//! solver-bench run benchmarks.txt cvc5+ethos --jobs 8 --timeout 300 --memout 4096
//!
//! # Write results somewhere else and keep a JSON record of the run
//! solver-bench run benchmarks.txt duper --output_dir /data/out --export run.json
//!
//! # List supported solvers
//! solver-bench solvers --detailed
//!
//! # Create a configuration file
//! solver-bench config init
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

mod cli;
mod config;
mod executor;
mod models;
mod output;
mod results;
mod utils;

use cli::Args;
use config::{ConfigError, ConfigFile, EnvConfig, HarnessConfig};
use executor::{CommandResolver, Limits, ResolveCommand, TaskSource, WorkerPool};
use models::{RunSummary, SolverKind, TaskDescriptor};
use output::{OutputFormat, ResultFormatter};
use results::{ExportFormat, ResultCollector, StoredRun};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(LogLevel::select(
        args.verbose || env.verbose.unwrap_or(false),
        env.log_level.as_deref(),
    ));

    let config_path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));

    match args.command {
        cli::Command::Run(run_args) => {
            run_benchmarks(run_args, config_path.as_deref(), &env).await?;
        }
        cli::Command::Solvers(solvers_args) => {
            let config = load_config(config_path.as_deref(), &env)?;
            list_solvers(solvers_args, &config);
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, config_path.as_deref(), &env)?;
        }
    }

    Ok(())
}

/// Config file (or defaults) with environment overrides applied
fn load_config(path: Option<&Path>, env: &EnvConfig) -> Result<HarnessConfig> {
    let mut config = ConfigFile::load_or_default(path)?.harness;
    config.apply_env(env);
    Ok(config)
}

/// Command-line flags override everything else
fn apply_run_args(config: &mut HarnessConfig, args: &cli::RunArgs) {
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(memout) = args.memout {
        config.memout_mb = memout;
    }
    if let Some(interval) = args.sample_interval_ms {
        config.sample_interval_ms = interval;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(root) = &args.benchmark_root {
        config.benchmark_root = root.clone();
    }
    if let Some(dir) = &args.script_dir {
        config.script_dir = dir.clone();
    }
}

/// Startup checks that touch the filesystem. The task list is read first so a
/// bad list leaves no directories behind.
fn prepare_run(config: &HarnessConfig, input_file: &Path) -> Result<Vec<TaskDescriptor>> {
    let tasks = TaskSource::read(input_file)?;
    config.ensure_output_dir()?;
    Ok(tasks)
}

async fn run_benchmarks(
    args: cli::RunArgs,
    config_path: Option<&Path>,
    env: &EnvConfig,
) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Invalid output format: {}", args.format))?;
    let export_format = match &args.export {
        Some(path) => Some(ExportFormat::from_extension(path).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot export to {}: use a .json or .csv file",
                path.display()
            )
        })?),
        None => None,
    };

    let mut config = load_config(config_path, env)?;
    apply_run_args(&mut config, &args);
    config.validate()?;

    if SolverKind::from_str(&args.solver).is_none() {
        let known: Vec<&str> = SolverKind::all().iter().map(|s| s.name()).collect();
        return Err(ConfigError::UnknownSolver(args.solver.clone()))
            .with_context(|| format!("Supported solvers: {}", known.join(", ")));
    }

    let tasks = prepare_run(&config, &args.input_file)?;
    debug!("Effective configuration: {:?}", config);

    let resolver: Arc<dyn ResolveCommand> = Arc::new(CommandResolver::from_config(&config));
    let collector = Arc::new(ResultCollector::new(
        &config.output_dir,
        &config.benchmark_root,
    ));
    let pool = WorkerPool::new(
        config.jobs,
        Limits::from_config(&config),
        &config.output_dir,
        resolver,
        collector,
    );

    let started_at = Utc::now();
    let results = pool.run(tasks, &args.solver).await;
    let summary = RunSummary::new(args.solver.clone(), started_at, results);

    info!(
        "Finished {} tasks in {}ms: {} completed, {} timeout, {} memout, {} errors",
        summary.total,
        summary.wall_time_ms(),
        summary.completed,
        summary.timed_out,
        summary.memory_exceeded,
        summary.errors + summary.invalid
    );

    let mut formatter = ResultFormatter::new(format);
    if !std::io::stdout().is_terminal() {
        formatter = formatter.no_color();
    }
    let rendered = formatter.format_summary(&summary);
    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }

    if let (Some(path), Some(export_format)) = (&args.export, export_format) {
        StoredRun::new(summary, &config).export(path, export_format)?;
    }

    Ok(())
}

fn list_solvers(args: cli::SolversArgs, config: &HarnessConfig) {
    println!("\nSupported Solvers\n");
    println!("──────────────────────────────────────────────────────────────────────");

    for solver in SolverKind::all() {
        if args.detailed {
            println!("  {:20} {}", solver.name(), solver.description());
            println!("  {:20} script: {}", "", config.script_for(solver).display());
            if solver.takes_output_dir() {
                println!("  {:20} receives the output directory as first argument", "");
            }
            println!();
        } else {
            println!("  {}", solver.name());
        }
    }

    println!("──────────────────────────────────────────────────────────────────────\n");
}

fn manage_config(args: cli::ConfigArgs, config_path: Option<&Path>, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            ConfigFile::example().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env: show_env, format } => {
            if show_env {
                env.print_summary();
            } else {
                let config = ConfigFile {
                    harness: load_config(config_path, env)?,
                    ..ConfigFile::default()
                };
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| config_path.map(Path::to_path_buf))
                .or_else(ConfigFile::find)
                .unwrap_or_else(|| PathBuf::from("./solver-bench.yaml"));

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {}", path.display());
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => {
            config::print_env_help();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let args = Args::parse_from([
            "solver-bench",
            "run",
            "tasks.txt",
            "duper",
            "--jobs",
            "3",
            "--memout",
            "256",
            "--benchmark-root",
            "/data/bench",
        ]);
        let cli::Command::Run(run_args) = args.command else {
            panic!("Expected Run command");
        };

        let mut config = HarnessConfig::default().with_limits(120, 2048);
        apply_run_args(&mut config, &run_args);

        assert_eq!(config.jobs, 3);
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.memout_mb, 256);
        assert_eq!(config.benchmark_root, PathBuf::from("/data/bench"));
        assert_eq!(config.output_dir, HarnessConfig::default().output_dir);
    }

    #[test]
    fn test_env_then_cli_precedence() {
        let env = EnvConfig {
            timeout: Some(30),
            jobs: Some(2),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cfg.yaml");
        std::fs::write(
            &file,
            "version: \"1.0\"\nharness:\n  timeout_secs: 900\n  memout_mb: 512\n  jobs: 6\n",
        )
        .unwrap();

        let mut config = load_config(Some(&file), &env).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.memout_mb, 512);
        assert_eq!(config.jobs, 2);

        let args = Args::parse_from(["solver-bench", "run", "t.txt", "duper", "-j", "5"]);
        let cli::Command::Run(run_args) = args.command else {
            panic!("Expected Run command");
        };
        apply_run_args(&mut config, &run_args);
        assert_eq!(config.jobs, 5);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_missing_task_list_creates_no_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = HarnessConfig::default().with_output_dir(&out);

        let err = prepare_run(&config, &dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingTaskList(_))
        ));
        assert!(!out.exists());

        let list = dir.path().join("tasks.txt");
        std::fs::write(&list, "/bench/a.smt2\n").unwrap();
        let tasks = prepare_run(&config, &list).unwrap();
        assert_eq!(tasks, vec![TaskDescriptor::new("/bench/a.smt2")]);
        assert!(out.is_dir());
    }
}
