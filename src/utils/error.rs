//! Error types for the manga reader

use thiserror::Error;

/// Main error type for reader operations
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    /// Route parameter could not be resolved to a chapter
    #[error("invalid chapter route: {0}")]
    InvalidRoute(String),
    /// Chapter payload violated a page invariant
    #[error("invalid chapter content: {0}")]
    InvalidChapter(String),
    /// Session storage access failed
    #[error("storage error: {0}")]
    Storage(String),
    /// Configuration value could not be parsed
    #[error("configuration error: {0}")]
    Config(String),
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// URL parsing failed
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Network-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Credentials were rejected even after a refresh
    #[error("unauthorized")]
    Unauthorized,
    /// Connection, TLS or decoding failure
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ReaderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Network(NetworkError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }),
            None => Self::Network(NetworkError::Transport(err.to_string())),
        }
    }
}

/// Convenience Result type for reader operations
pub type Result<T> = std::result::Result<T, ReaderError>;
