//! Shared resource-data store
//!
//! The orchestrator owns one [`ResourceData`] per run and writes each
//! collector's output into it as the collector completes. Sibling
//! collectors and the provider's primary fetch read dependency data from
//! here instead of re-querying the provider.
//!
//! Writer discipline: during the fetch phase, each key is written only by
//! the collector registered under it; the provider's primary fetch may
//! override or invalidate entries afterwards.

use cumulo_core::InventoryRecord;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A collector's cached output for one resource type
#[derive(Debug, Clone, Default)]
pub struct CachedResource {
    /// Normalized records the collector returned
    pub records: Vec<InventoryRecord>,

    /// Raw per-entity data, present for dependency producers
    pub raw: Option<Value>,
}

/// Keyed store: resource type → last-fetched result
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    inner: Arc<RwLock<HashMap<String, CachedResource>>>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for a resource type, if it has been fetched this run
    pub fn get(&self, resource_type: &str) -> Option<CachedResource> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(resource_type).cloned())
    }

    /// Raw dependency data for a resource type
    pub fn raw(&self, resource_type: &str) -> Option<Value> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(resource_type).and_then(|c| c.raw.clone()))
    }

    /// Normalized records for a resource type
    pub fn records(&self, resource_type: &str) -> Option<Vec<InventoryRecord>> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(resource_type).map(|c| c.records.clone()))
    }

    /// Replace the cached entry for a resource type
    pub fn set(&self, resource_type: impl Into<String>, cached: CachedResource) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(resource_type.into(), cached);
        }
    }

    /// Invalidate the cached entry for a resource type
    pub fn delete(&self, resource_type: &str) -> Option<CachedResource> {
        self.inner.write().ok().and_then(|mut map| map.remove(resource_type))
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.inner
            .read()
            .map(|map| map.contains_key(resource_type))
            .unwrap_or(false)
    }

    /// Resource types currently cached
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}
