//! Service error types

use thiserror::Error;

/// Errors surfaced by the inventory service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown collector: {0}")]
    UnknownCollector(String),

    #[error("Collector is disabled: {0}")]
    CollectorDisabled(String),

    #[error("Collection error: {0}")]
    Collect(#[from] cumulo_collect::CollectError),

    #[error("Storage error: {0}")]
    Storage(#[from] cumulo_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
