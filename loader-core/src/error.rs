//! Observer error types.

use thiserror::Error;

/// Error type for observer construction and configuration.
///
/// A request that never resolves is not an error; it simply stays waiting.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// A requested type name was empty or whitespace only.
    #[error("Blank type name at position {0}")]
    BlankName(usize),

    /// Polling was required but no tokio runtime is current.
    #[error("No tokio runtime available to schedule availability checks")]
    NoRuntime,

    /// Configuration failed validation.
    #[error("Invalid observer configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("Failed to parse observer configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;
