//! Error types for the Snapmap core.
//!
//! Errors are organized by subsystem: configuration, the AI provider, and
//! the ingestion pipeline's load-bearing collaborators (storage and
//! persistence). AI failures on the synchronous path never escape the
//! describer — see `ai::describer`.

use thiserror::Error;

/// Top-level error type for Snapmap operations.
#[derive(Error, Debug)]
pub enum SnapmapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// AI provider errors
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Ingestion pipeline errors
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// AI provider errors.
///
/// `Config` is fatal and signals a deployment defect (missing credential),
/// never a transient condition. `Provider` carries the HTTP status code when
/// one was observed; `ai::retry::is_retryable` classifies it.
#[derive(Error, Debug)]
pub enum AiError {
    /// Provider credential missing or empty
    #[error("AI provider configuration error: {0}")]
    Config(String),

    /// The provider rejected or failed the request
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        status_code: Option<u16>,
    },
}

/// Errors from the ingestion pipeline's external collaborators.
///
/// Both variants are load-bearing: unlike AI failures they propagate to the
/// caller as the operation's definitive failure.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Object storage upload failed — no image reference, no record
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata persistence failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Convenience type alias for Snapmap results.
pub type Result<T> = std::result::Result<T, SnapmapError>;
