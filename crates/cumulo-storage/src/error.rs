//! Storage error types

use thiserror::Error;

/// Storage engine errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage is not connected")]
    NotConnected,

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
