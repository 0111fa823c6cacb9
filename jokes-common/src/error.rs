//! Common error types for the joke services

use thiserror::Error;

/// Common result type for joke service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the joke services
#[derive(Error, Debug)]
pub enum Error {
    /// TOML file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value could not be encoded into the requested output format
    #[error("Encoding error: {0}")]
    Encode(String),
}
