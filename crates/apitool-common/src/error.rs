//! Error types for configuration handling.

use thiserror::Error;

/// Errors that can occur while loading or validating a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;
