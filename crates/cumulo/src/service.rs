//! Inventory service
//!
//! [`CloudInventory`] is the embedding application's entry point: it builds
//! provider collectors from the registries, runs orchestrated collection
//! cycles, and persists the resulting batches. Store and cleanup take the
//! service lock so two runs can never interleave same-source saves — the
//! storage engine itself does not serialize writers.

use crate::config::InventoryConfig;
use crate::error::{Result, ServiceError};
use cumulo_collect::{CollectorOptions, Orchestrator, ProviderRegistry, ResourceRegistry};
use cumulo_core::InventoryRecord;
use cumulo_storage::InventoryStorage;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Collection pipeline facade
pub struct CloudInventory {
    config: InventoryConfig,
    providers: ProviderRegistry,
    resources: Arc<ResourceRegistry>,
    store_lock: Mutex<()>,
}

impl CloudInventory {
    pub fn new(
        config: InventoryConfig,
        providers: ProviderRegistry,
        resources: ResourceRegistry,
    ) -> Self {
        Self {
            config,
            providers,
            resources: Arc::new(resources),
            store_lock: Mutex::new(()),
        }
    }

    /// Enabled collector names, sorted
    pub fn collectors(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .config
            .collectors
            .iter()
            .filter(|(_, entry)| !entry.disabled)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Run one collection cycle for a configured collector account.
    pub async fn collect(
        &self,
        name: &str,
        options: CollectorOptions,
    ) -> Result<Vec<InventoryRecord>> {
        let entry = self
            .config
            .collectors
            .get(name)
            .ok_or_else(|| ServiceError::UnknownCollector(name.to_string()))?;
        if entry.disabled {
            return Err(ServiceError::CollectorDisabled(name.to_string()));
        }

        tracing::info!(collector = %name, module = %entry.module, "collection run starting");
        let provider = self.providers.create(entry.to_collector_config(name))?;
        let mut orchestrator = Orchestrator::new(
            provider,
            self.resources.clone(),
            entry.collect.clone(),
            options,
        );
        let records = orchestrator.run().await?;
        Ok(records)
    }

    /// Persist one collected batch as a new snapshot version per source.
    ///
    /// Returns `false` for an empty batch (nothing written).
    pub async fn store(&self, records: &mut [InventoryRecord]) -> Result<bool> {
        let _guard = self.store_lock.lock().await;

        let mut storage = InventoryStorage::new(&self.config.storage.dsn);
        storage.connect().await?;
        let result = storage.save(records).await;
        storage.disconnect().await;

        let saved = result?;
        if !saved {
            tracing::warn!("empty batch, nothing stored");
        }
        Ok(saved)
    }

    /// Prune snapshots older than `days`; returns the number removed.
    pub async fn cleanup(&self, days: i64) -> Result<u64> {
        let _guard = self.store_lock.lock().await;

        let mut storage = InventoryStorage::new(&self.config.storage.dsn);
        storage.connect().await?;
        let result = storage.cleanup(days).await;
        storage.disconnect().await;
        Ok(result?)
    }

    /// Read-back access for queries, bypassing the collection path.
    pub async fn open_storage(&self) -> Result<InventoryStorage> {
        let mut storage = InventoryStorage::new(&self.config.storage.dsn);
        storage.connect().await?;
        Ok(storage)
    }
}
