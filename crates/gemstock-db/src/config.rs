//! # Configuration
//!
//! Configuration for binaries that open a Gemstock database.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GEMSTOCK_DB_PATH=/var/lib/gemstock/gemstock.db                     │
//! │     GEMSTOCK_DB_MAX_CONNECTIONS=8                                      │
//! │     GEMSTOCK_LOG=debug,sqlx=warn                                       │
//! │     GEMSTOCK_LOG_FORMAT=pretty                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/gemstock/gemstock.toml (Linux)                           │
//! │     ~/Library/Application Support/com.gemstock.gemstock/ (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/gemstock/gemstock.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! run_migrations = true
//!
//! [logging]
//! filter = "info,gemstock=debug,sqlx=warn"
//! format = "compact"   # compact | pretty | full
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path. `:memory:` opens a throwaway in-memory database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "gemstock", "gemstock")
        .map(|dirs| dirs.data_dir().join("gemstock.db"))
        .unwrap_or_else(|| PathBuf::from("gemstock.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Single-line, abbreviated.
    #[default]
    Compact,
    /// Multi-line, human-friendly.
    Pretty,
    /// Single-line with all span fields.
    Full,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "full" => Ok(LogFormat::Full),
            other => Err(ConfigError::Invalid(format!(
                "Unknown log format: '{}'. Valid options: compact, pretty, full",
                other
            ))),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_filter() -> String {
    "info,gemstock=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (gemstock.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let db = &self.database;

        if db.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if db.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if db.min_connections > db.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                db.min_connections, db.max_connections
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("GEMSTOCK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("GEMSTOCK_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid GEMSTOCK_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(filter) = lookup("GEMSTOCK_LOG") {
            self.logging.filter = filter;
        }

        if let Some(format) = lookup("GEMSTOCK_LOG_FORMAT") {
            match format.parse() {
                Ok(parsed) => self.logging.format = parsed,
                Err(_) => warn!(format = %format, "Unknown log format in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gemstock", "gemstock")
            .map(|dirs| dirs.config_dir().join("gemstock.toml"))
    }

    /// Builds the pool configuration for [`Database::new`](crate::Database::new).
    pub fn db_config(&self) -> DbConfig {
        let db = &self.database;
        let base = if db.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&db.path)
                .max_connections(db.max_connections)
                .min_connections(db.min_connections)
        };

        base.connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .run_migrations(db.run_migrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.run_migrations);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "/tmp/gemstock-test.db"

            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/gemstock-test.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.filter, default_filter());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEMSTOCK_DB_PATH", ":memory:"),
            ("GEMSTOCK_DB_MAX_CONNECTIONS", "9"),
            ("GEMSTOCK_LOG", "trace"),
            ("GEMSTOCK_LOG_FORMAT", "nonsense"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from(":memory:"));
        assert_eq!(config.database.max_connections, 9);
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 2;
        config.database.min_connections = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_db_config_in_memory() {
        let mut config = AppConfig::default();
        config.database.path = PathBuf::from(":memory:");
        let db = config.db_config();
        assert_eq!(db.max_connections, 1);
        assert!(db.is_in_memory());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[logging]"));
    }
}
