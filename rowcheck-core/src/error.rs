//! Error types for the rowcheck core library.

use thiserror::Error;

/// Main error type for configuration and bootstrap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be read, parsed or merged
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration parsed but violates a constraint
    #[error("Validation error: {0}")]
    Validation(String),

    /// Logging could not be initialized
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rowcheck core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}
