//! Domain-specific error types for insura

use thiserror::Error;

/// Main error type for the insura pipeline
#[derive(Error, Debug)]
pub enum InsuraError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Profile not found: {user_id}")]
    NotFound { user_id: String },

    #[error("Embedding provider error: {message}")]
    Embedding { message: String },

    #[error("Knowledge index corrupted: {message}")]
    IndexCorruption { message: String },

    #[error("Generation backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("Backend output did not match the recommendation shape: {message}")]
    MalformedOutput { message: String, raw: String },

    #[error("Recommendation incomplete: {message}")]
    Completeness { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for InsuraError {
    fn from(err: anyhow::Error) -> Self {
        InsuraError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for InsuraError {
    fn from(err: serde_json::Error) -> Self {
        InsuraError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for InsuraError {
    fn from(err: std::io::Error) -> Self {
        InsuraError::Io {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for InsuraError {
    fn from(err: reqwest::Error) -> Self {
        InsuraError::Embedding {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

/// Result type alias for insura operations
pub type Result<T> = std::result::Result<T, InsuraError>;
