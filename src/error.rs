//! Error types for the Rev gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Rev gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// An operation referenced a session that is not in the store
    #[error("no active conversation for session {0}")]
    SessionNotFound(String),

    /// The generation API returned a non-success status or an unusable payload
    #[error("upstream generation error: {0}")]
    Upstream(String),

    /// A tone preference outside the accepted set
    #[error("invalid tone preference: {0}")]
    InvalidTone(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
