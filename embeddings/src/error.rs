//! Error types for the embedder.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors raised while validating plugin configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// One or more required parameters are absent or empty.
    #[error(
        "Missing required configuration parameters: {}. Provide them via JSON config file or environment variables.",
        .0.join(", ")
    )]
    MissingParameters(Vec<&'static str>),

    /// A parameter is present but cannot be coerced to its type.
    #[error("Parameter '{name}' must be {expected}, got: {value}")]
    InvalidParameter {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Errors that can occur while building the embedder or generating embeddings.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Configuration rejected at construction time.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport failure (connect, timeout, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the embeddings API.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response was well-formed JSON but carried no usable embedding.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
