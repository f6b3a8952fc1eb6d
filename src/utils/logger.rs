//! Logging utilities
//!
//! Provides logging configuration and helpers.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// `--verbose` forces debug; otherwise the configured level, defaulting to info
    pub fn select(verbose: bool, configured: Option<&str>) -> Self {
        if verbose {
            return LogLevel::Debug;
        }
        configured
            .and_then(Self::from_str)
            .unwrap_or(LogLevel::Info)
    }
}

/// Filter directive for this crate at the given level
fn directive(level: LogLevel) -> String {
    format!("solver_bench={}", level.to_tracing_level())
}

/// Initialize the logger. `RUST_LOG` takes precedence when set.
/// Logs go to stderr so the summary on stdout stays machine-readable.
pub fn init_logger(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_select_level() {
        assert_eq!(LogLevel::select(true, Some("error")), LogLevel::Debug);
        assert_eq!(LogLevel::select(false, None), LogLevel::Info);
        assert_eq!(LogLevel::select(false, Some("warning")), LogLevel::Warn);
        assert_eq!(LogLevel::select(false, Some("loud")), LogLevel::Info);
        assert_eq!(directive(LogLevel::Debug), "solver_bench=DEBUG");
        assert_eq!(
            directive(LogLevel::select(false, Some("trace"))),
            "solver_bench=TRACE"
        );
        assert_eq!(
            directive(LogLevel::select(false, Some("error"))),
            "solver_bench=ERROR"
        );
    }
}
