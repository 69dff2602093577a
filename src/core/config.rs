//! Configuration management for tubegraph
//!
//! Defaults come from `Default`, then `tubegraph.toml` when present, then
//! `TG_*` environment variables. The result is validated before use.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tubegraph_core::constants::DEFAULT_MEDIA_TIMEOUT_MS;

/// Default configuration file looked up by [`Config::load`]
pub const CONFIG_FILE: &str = "tubegraph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entity store persistence
    pub storage: StorageConfig,

    /// Media store
    pub media: MediaConfig,

    /// Reconciliation journal
    pub reconciliation: ReconciliationConfig,

    /// Metrics and monitoring
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory path
    pub data_dir: PathBuf,

    /// Snapshot file name inside the data directory
    pub snapshot_file: String,

    /// Write a snapshot after every command
    pub snapshot_on_exit: bool,
}

/// Media store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory holding uploaded files
    pub root_dir: PathBuf,

    /// Deadline for a single media store call
    #[serde(with = "duration_str")]
    pub timeout: Duration,
}

/// Reconciliation journal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Journal file name inside the data directory
    pub journal_file: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Print the Prometheus exposition after `stats`
    pub enable: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            snapshot_file: "store.msgpack".to_string(),
            snapshot_on_exit: true,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./data/media"),
            timeout: Duration::from_millis(DEFAULT_MEDIA_TIMEOUT_MS),
        }
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self { journal_file: "reconciliation.jsonl".to_string() }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enable: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if std::path::Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TG_*` overrides from any key lookup
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        // Storage overrides
        if let Some(data_dir) = var("TG_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(flag) = var("TG_SNAPSHOT_ON_EXIT") {
            self.storage.snapshot_on_exit = flag.parse()
                .map_err(|e| Error::config(format!("Invalid snapshot flag: {}", e)))?;
        }

        // Media overrides
        if let Some(root) = var("TG_MEDIA_DIR") {
            self.media.root_dir = PathBuf::from(root);
        }

        if let Some(timeout) = var("TG_MEDIA_TIMEOUT") {
            self.media.timeout = parse_duration(&timeout)
                .map_err(|e| Error::config(format!("Invalid media timeout: {}", e)))?;
        }

        // Metrics overrides
        if let Some(flag) = var("TG_METRICS") {
            self.metrics.enable = flag.parse()
                .map_err(|e| Error::config(format!("Invalid metrics flag: {}", e)))?;
        }

        // Logging overrides
        if let Some(level) = var("TG_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("TG_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.snapshot_file.trim().is_empty() {
            return Err(Error::config("Snapshot file name must not be empty"));
        }

        if self.reconciliation.journal_file.trim().is_empty() {
            return Err(Error::config("Journal file name must not be empty"));
        }

        if self.storage.snapshot_file == self.reconciliation.journal_file {
            return Err(Error::config("Snapshot and journal must be different files"));
        }

        if self.media.timeout.is_zero() {
            return Err(Error::config("Media timeout must be positive"));
        }

        // Validate log level
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {},
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {},
            _ => return Err(Error::config("Invalid log format (expected pretty or json)")),
        }

        Ok(())
    }

    /// Full path of the store snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.snapshot_file)
    }

    /// Full path of the reconciliation journal
    pub fn journal_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.reconciliation.journal_file)
    }
}

/// Durations written as human strings such as `"250ms"` or `"5s"`
mod duration_str {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}ms", value.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration string like '30s' or '250ms'")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
                super::parse_duration(value).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
                u64::try_from(value)
                    .map(Duration::from_secs)
                    .map_err(|_| E::custom("duration must not be negative"))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Simple duration parser for common formats
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.parse().map_err(|_| "Invalid milliseconds")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: u64 = secs.parse().map_err(|_| "Invalid seconds")?;
        Ok(Duration::from_secs(secs))
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.parse().map_err(|_| "Invalid minutes")?;
        Ok(Duration::from_secs(mins * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        let hours: u64 = hours.parse().map_err(|_| "Invalid hours")?;
        Ok(Duration::from_secs(hours * 3600))
    } else {
        // Try parsing as raw seconds
        let secs: u64 = s.parse().map_err(|_| "Invalid duration format")?;
        Ok(Duration::from_secs(secs))
    }
}
