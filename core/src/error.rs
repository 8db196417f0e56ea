//! Error types for Ludex

use thiserror::Error;

/// Core error type for Ludex operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request canceled")]
    Canceled,
}

impl Error {
    /// True when the error is a cancellation rather than a real failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
