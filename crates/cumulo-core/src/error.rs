//! Core error types

use thiserror::Error;

/// Errors raised while building or serializing records
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
