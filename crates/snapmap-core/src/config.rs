//! Configuration management for Snapmap.
//!
//! Configuration is loaded from a platform-appropriate config directory
//! with sensible defaults; every section implements `Default` so a missing
//! file or section still yields a runnable configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Snapmap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI provider settings
    pub provider: ProviderConfig,

    /// Retry policy for the synchronous description path
    pub retry: RetryConfig,

    /// Streaming path settings
    pub stream: StreamConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Local storage settings (development collaborators)
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Generative-AI provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base endpoint
    pub endpoint: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Retry settings for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Max attempts per description request (first call included)
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Streaming path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Max fragments buffered between the provider and the consumer
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { buffer_size: 32 }
    }
}

/// Resource limits to bound a single provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-attempt provider call timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 60_000,
        }
    }
}

/// Local storage settings used by the development collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where uploaded media files are stored
    pub media_dir: String,

    /// JSONL index of persisted photo records
    pub index_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_dir: "~/.snapmap/media".to_string(),
            index_path: "~/.snapmap/photos.jsonl".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
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
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// ~/.snapmap/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "snapmap", "snapmap")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".snapmap").join("config.toml")
            })
    }

    /// Get the resolved media directory path (with ~ expansion).
    pub fn media_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.storage.media_dir);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved photo index path (with ~ expansion).
    pub fn index_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.storage.index_path);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        if self.stream.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "stream.buffer_size must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.provider.model.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.model must not be empty".into(),
            ));
        }
        if self.provider.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.endpoint must not be empty".into(),
            ));
        }
        Ok(())
    }
}
