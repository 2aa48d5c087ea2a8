//! Core error types and traits

use thiserror::Error;

/// Result type alias for parley operations
pub type ParleyResult<T> = Result<T, ParleyError>;

/// Common surface shared by parley errors.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Stable error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Human-readable error message
    fn message(&self) -> &str;

    /// Optional context about where the error occurred
    fn context(&self) -> Option<&str> {
        None
    }
}

/// Main error type for parley
#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Provider-side failures: bad responses, decode errors, in-band vendor errors
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        provider: Option<String>,
        context: Option<String>,
    },

    /// Transport failures and non-success status codes
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
        context: Option<String>,
    },

    /// Filesystem errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON/YAML (de)serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Session lifecycle violations (already exists, cannot quit, ...)
    #[error("Session error: {message}")]
    Session {
        message: String,
        session_id: Option<String>,
        context: Option<String>,
    },

    /// Invalid user input
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        resource_type: Option<String>,
        context: Option<String>,
    },

    /// The consumer abandoned a stream
    #[error("Stream was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
