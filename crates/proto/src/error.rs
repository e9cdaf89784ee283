use std::time::Duration;

use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Model directory fetch error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Inference provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Internal protocol type error.
    #[error("Proto error: {0}")]
    Proto(#[from] ProtoError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Model directory errors.
///
/// Returned by catalog loading only; callers render a fallback notice.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// The directory answered with a non-success status.
    #[error("http status: {0}")]
    Status(String),

    /// The body was not a JSON array of models.
    #[error("json decode: {0}")]
    Decode(String),
}

/// Inference provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Remote API failure.
    #[error("{0}")]
    Api(String),

    /// Provider throttled the request.
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Provider response schema/content was invalid.
    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),

    /// Request exceeded the configured deadline.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Internal proto errors
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Invalid role string value.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Generic serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
