//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "SOLVER_BENCH";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Parallel jobs from SOLVER_BENCH_JOBS
    pub jobs: Option<usize>,
    /// Timeout from SOLVER_BENCH_TIMEOUT
    pub timeout: Option<u64>,
    /// Memory limit from SOLVER_BENCH_MEMOUT
    pub memout: Option<u64>,
    /// Output root from SOLVER_BENCH_OUTPUT_DIR
    pub output_dir: Option<String>,
    /// Benchmark root from SOLVER_BENCH_BENCHMARK_ROOT
    pub benchmark_root: Option<String>,
    /// Script directory from SOLVER_BENCH_SCRIPT_DIR
    pub script_dir: Option<String>,
    /// Config file from SOLVER_BENCH_CONFIG
    pub config_file: Option<String>,
    /// Verbose from SOLVER_BENCH_VERBOSE
    pub verbose: Option<bool>,
    /// Log level from SOLVER_BENCH_LOG_LEVEL
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            jobs: get_env_parse("JOBS"),
            timeout: get_env_parse("TIMEOUT"),
            memout: get_env_parse("MEMOUT"),
            output_dir: get_env("OUTPUT_DIR"),
            benchmark_root: get_env("BENCHMARK_ROOT"),
            script_dir: get_env("SCRIPT_DIR"),
            config_file: get_env("CONFIG"),
            verbose: get_env_bool("VERBOSE"),
            log_level: get_env("LOG_LEVEL"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.jobs.is_some()
            || self.timeout.is_some()
            || self.memout.is_some()
            || self.output_dir.is_some()
            || self.benchmark_root.is_some()
            || self.script_dir.is_some()
            || self.config_file.is_some()
            || self.verbose.is_some()
            || self.log_level.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        if !self.has_any() {
            println!("No {ENV_PREFIX}_* variables set");
            return;
        }
        println!("Environment Configuration:");
        println!("  {}_JOBS:           {:?}", ENV_PREFIX, self.jobs);
        println!("  {}_TIMEOUT:        {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_MEMOUT:         {:?}", ENV_PREFIX, self.memout);
        println!("  {}_OUTPUT_DIR:     {:?}", ENV_PREFIX, self.output_dir);
        println!("  {}_BENCHMARK_ROOT: {:?}", ENV_PREFIX, self.benchmark_root);
        println!("  {}_SCRIPT_DIR:     {:?}", ENV_PREFIX, self.script_dir);
        println!("  {}_CONFIG:         {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_VERBOSE:        {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_LOG_LEVEL:      {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all SOLVER_BENCH environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_JOBS            Number of benchmarks to run in parallel");
    println!("  {ENV_PREFIX}_TIMEOUT         Timeout per benchmark in seconds");
    println!("  {ENV_PREFIX}_MEMOUT          Memory limit per benchmark in MB");
    println!("  {ENV_PREFIX}_OUTPUT_DIR      Root directory for solver output");
    println!("  {ENV_PREFIX}_BENCHMARK_ROOT  Directory all benchmarks live under");
    println!("  {ENV_PREFIX}_SCRIPT_DIR      Directory holding <solver>.sh wrappers");
    println!("  {ENV_PREFIX}_CONFIG          Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE         Enable verbose output (true/false)");
    println!("  {ENV_PREFIX}_LOG_LEVEL       trace, debug, info, warn or error");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_JOBS=8");
    println!("  solver-bench run benchmarks.txt cvc5+ethos --timeout 300");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sets variables for the test's lifetime and restores them on drop
    struct EnvGuard {
        previous: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&str, &str)]) -> Self {
            let previous = vars
                .iter()
                .map(|(name, value)| {
                    let key = format!("{ENV_PREFIX}_{name}");
                    let old = env::var(&key).ok();
                    env::set_var(&key, value);
                    (key, old)
                })
                .collect();
            Self { previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.previous {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.jobs.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_load() {
        let _guard = EnvGuard::set(&[
            ("MEMOUT", "2048"),
            ("BENCHMARK_ROOT", "/data/bench"),
            ("VERBOSE", "yes"),
            ("LOG_LEVEL", "warn"),
        ]);

        let config = EnvConfig::load();
        assert_eq!(config.memout, Some(2048));
        assert_eq!(config.benchmark_root, Some("/data/bench".to_string()));
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(config.has_any());
    }

    #[test]
    fn test_env_unparseable_number_is_ignored() {
        let _guard = EnvGuard::set(&[("TIMEOUT", "soon")]);

        let config = EnvConfig::load();
        assert_eq!(config.timeout, None);
    }
}
