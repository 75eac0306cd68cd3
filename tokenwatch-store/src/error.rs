//! Store error types.

use thiserror::Error;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error("Config serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
