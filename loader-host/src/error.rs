//! Loader error types.

use loader_core::ObserverError;
use thiserror::Error;

/// Error type for loader operations.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The availability observer rejected the request or configuration.
    #[error(transparent)]
    Observer(#[from] ObserverError),

    /// Loader configuration could not be parsed.
    #[error("Failed to parse loader configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;
