//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run a solver over a list of benchmarks under time and memory limits
#[derive(Parser, Debug)]
#[command(name = "solver-bench")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate proof-producing SMT solvers on benchmark sets")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one solver over every benchmark in a list file
    Run(RunArgs),

    /// List the supported solvers
    Solvers(SolversArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// File listing one benchmark path per line
    pub input_file: PathBuf,

    /// Solver to run (see `solvers`)
    pub solver: String,

    /// Number of benchmarks to run in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Timeout per benchmark in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Memory limit per benchmark in MB
    #[arg(short, long)]
    pub memout: Option<u64>,

    /// Root directory for solver output
    #[arg(short, long = "output_dir", visible_alias = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Directory all benchmarks live under
    #[arg(long)]
    pub benchmark_root: Option<PathBuf>,

    /// Directory holding the solver wrapper scripts
    #[arg(long)]
    pub script_dir: Option<PathBuf>,

    /// Memory sampling interval in milliseconds
    #[arg(long)]
    pub sample_interval_ms: Option<u64>,

    /// Output format (summary, table, json, json-pretty, csv)
    #[arg(short, long, default_value = "summary")]
    pub format: String,

    /// Also write the run summary to a .json or .csv file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Arguments for solvers command
#[derive(Parser, Debug)]
pub struct SolversArgs {
    /// Show the wrapper script each solver resolves to
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Destination file
        #[arg(short, long, default_value = "./solver-bench.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment overrides instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the first one found)
        file: Option<PathBuf>,
    },

    /// List supported environment variables
    Env,
}
