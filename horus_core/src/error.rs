//! Error types shared by the HORUS crates

use thiserror::Error;

/// Main error type for HORUS core operations
#[derive(Debug, Error)]
pub enum HorusError {
    /// I/O failure (parameter files, directories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of a parameter value failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parameter file could not be parsed or written
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A compulsory parameter is missing from the store
    #[error("Parameter '{0}' not found")]
    ParamNotFound(String),

    /// A parameter exists but has the wrong type
    #[error("Parameter '{name}' has an unexpected type: {reason}")]
    ParamType { name: String, reason: String },

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HorusError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        HorusError::Config(msg.into())
    }
}

/// Result type for HORUS core operations
pub type HorusResult<T> = Result<T, HorusError>;
