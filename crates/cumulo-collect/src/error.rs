//! Collection error types

use thiserror::Error;

/// Errors raised during a provider collection run
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Login failed for provider {0}: {1}")]
    LoginFailed(String, String),

    #[error("Session propagation failed for resource {0}: {1}")]
    SessionPropagation(String, String),

    #[error("Fetch failed for resource {0}: {1}")]
    FetchFailed(String, String),

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("Unknown provider module: {0}")]
    UnknownProvider(String),

    #[error("Invalid collector configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Collection cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    TaskFailed(String),

    #[error("Record error: {0}")]
    Record(#[from] cumulo_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CollectError>;
