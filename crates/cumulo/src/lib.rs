//! Cumulo
//!
//! Cloud inventory collection pipeline: pluggable provider collectors feed a
//! normalizing orchestrator, and every run is persisted as an independently
//! versioned snapshot per source.
//!
//! The [`CloudInventory`] service ties the pieces together:
//!
//! ```text
//! collect(name) ─▶ Orchestrator ─▶ Vec<InventoryRecord>
//! store(batch)  ─▶ lock ─▶ connect ─▶ save ─▶ disconnect
//! cleanup(days) ─▶ lock ─▶ connect ─▶ prune ─▶ disconnect
//! ```

pub mod config;
pub mod error;
pub mod service;

// Re-exports
pub use config::{CollectorEntry, InventoryConfig, StorageConfig};
pub use error::{Result, ServiceError};
pub use service::CloudInventory;

pub use cumulo_collect::{
    CollectorConfig, CollectorOptions, Orchestrator, ProviderCollector, ProviderRegistry,
    ResourceCollector, ResourceData, ResourceRegistry, Session,
};
pub use cumulo_core::{Attrs, InventoryRecord, RecordBuilder};
pub use cumulo_storage::{InventoryStorage, SourceVersion};
