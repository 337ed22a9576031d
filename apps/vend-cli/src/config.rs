//! # CLI Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`VEND_DB_PATH`, `VEND_LOG`)
//! 3. Config file (`vend.toml` in the platform config dir, or `--config`)
//! 4. Defaults (this file)
//!
//! `RUST_LOG`, when set, replaces the log filter entirely.
//!
//! ## Example `vend.toml`
//! ```toml
//! database_path = "/var/lib/vend/vending_machine.db"
//! log_filter = "warn,vend=info"
//! tender_buffer = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info,vend=debug,sqlx=warn";

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "vending_machine.db";

const CONFIG_FILE: &str = "vend.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the `vend` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// `tracing` EnvFilter directive.
    pub log_filter: String,

    /// Bound of each tender channel direction.
    pub tender_buffer: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            database_path: default_database_path(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            tender_buffer: 8,
        }
    }
}

impl CliConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist. The default location is
    /// optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Reads a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `VEND_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("VEND_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(filter) = lookup("VEND_LOG") {
            self.log_filter = filter;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".into()));
        }

        if self.tender_buffer == 0 {
            return Err(ConfigError::Invalid(
                "tender_buffer must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

/// `vend.toml` in the platform config directory.
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "vend", "machine")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Platform data directory, or the working directory when there is none.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.vend.machine/vending_machine.db`
/// - **Windows**: `%APPDATA%\vend\machine\data\vending_machine.db`
/// - **Linux**: `~/.local/share/machine/vending_machine.db`
fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "vend", "machine")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.database_path.ends_with(DATABASE_FILE));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vend.toml");
        std::fs::write(&path, "database_path = \"/tmp/vm.db\"\n").unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/vm.db"));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.tender_buffer, 8);
    }

    #[test]
    fn test_bad_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vend.toml");
        std::fs::write(&path, "tender_buffer = \"lots\"\n").unwrap();

        assert!(matches!(
            CliConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            CliConfig::load(Some(&dir.path().join("missing.toml"))),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_environment_beats_file() {
        let mut config = CliConfig {
            database_path: PathBuf::from("/from/file.db"),
            log_filter: "warn".to_string(),
            tender_buffer: 8,
        };

        let env: HashMap<&str, &str> =
            [("VEND_DB_PATH", "/from/env.db"), ("VEND_LOG", "debug")].into();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/from/env.db"));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_zero_buffer_is_invalid() {
        let config = CliConfig {
            tender_buffer: 0,
            ..CliConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
