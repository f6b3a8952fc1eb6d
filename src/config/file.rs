//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::HarnessConfig;
use crate::models::SolverKind;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./solver-bench.yaml",
    "./solver-bench.yml",
    "./.solver-bench.yaml",
    "~/.config/solver-bench/config.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Harness settings
    #[serde(default)]
    pub harness: HarnessConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            harness: HarnessConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::find() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from an explicit path, or fall back to the standard locations
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        self.harness.validate()?;
        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        let mut harness = HarnessConfig::default().with_jobs(4);
        harness.solver_scripts.insert(
            SolverKind::VeritSledgehammer.name().to_string(),
            PathBuf::from("/home/user/artifact/verit+sledgehammer.sh"),
        );

        Self {
            version: default_version(),
            harness,
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.harness.jobs, 1);
    }

    #[test]
    fn test_config_file_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = ConfigFile::example();
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.harness.jobs, 4);
        assert_eq!(
            loaded.harness.script_for(SolverKind::VeritSledgehammer),
            PathBuf::from("/home/user/artifact/verit+sledgehammer.sh")
        );
    }

    #[test]
    fn test_config_file_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        ConfigFile::example().save(&path).unwrap();
        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.harness.timeout_secs, 60);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "harness:\n  jobs: 12\n  memout_mb: 4096\n").unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.version, "1.0");
        assert_eq!(loaded.harness.jobs, 12);
        assert_eq!(loaded.harness.memout_mb, 4096);
        assert_eq!(loaded.harness.timeout_secs, 60);
    }

    #[test]
    fn test_validate_rejects_bad_version_and_solver() {
        let mut config = ConfigFile::default();
        config.version = "9.9".to_string();
        assert!(config.validate().is_err());

        let mut config = ConfigFile::default();
        config
            .harness
            .solver_scripts
            .insert("vampire".to_string(), PathBuf::from("/bin/vampire"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("./test.yaml");
        assert_eq!(path, PathBuf::from("./test.yaml"));
    }
}
