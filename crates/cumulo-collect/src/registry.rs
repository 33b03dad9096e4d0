//! Collector registries
//!
//! Providers and resource collectors are looked up by name at runtime
//! through explicit factory registries. Unknown keys yield a typed error,
//! never a load failure.

use crate::config::CollectorConfig;
use crate::error::{CollectError, Result};
use crate::resource::{ProviderCollector, ResourceCollector};
use std::collections::HashMap;

type ResourceFactory = Box<dyn Fn() -> Box<dyn ResourceCollector> + Send + Sync>;
type ProviderFactory =
    Box<dyn Fn(CollectorConfig) -> Result<Box<dyn ProviderCollector>> + Send + Sync>;

/// Resource-type name → collector factory
#[derive(Default)]
pub struct ResourceRegistry {
    factories: HashMap<String, ResourceFactory>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, resource_type: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ResourceCollector> + Send + Sync + 'static,
    {
        self.factories.insert(resource_type.into(), Box::new(factory));
    }

    /// Instantiate a collector for a resource type.
    pub fn create(&self, resource_type: &str) -> Result<Box<dyn ResourceCollector>> {
        let factory = self
            .factories
            .get(resource_type)
            .ok_or_else(|| CollectError::UnknownResource(resource_type.to_string()))?;
        Ok(factory())
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.factories.contains_key(resource_type)
    }

    /// Registered resource types, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.names())
            .finish()
    }
}

/// Provider module name → provider factory
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, module: impl Into<String>, factory: F)
    where
        F: Fn(CollectorConfig) -> Result<Box<dyn ProviderCollector>> + Send + Sync + 'static,
    {
        self.factories.insert(module.into(), Box::new(factory));
    }

    /// Instantiate a provider collector for a configured account.
    pub fn create(&self, config: CollectorConfig) -> Result<Box<dyn ProviderCollector>> {
        let factory = self
            .factories
            .get(&config.module)
            .ok_or_else(|| CollectError::UnknownProvider(config.module.clone()))?;
        factory(config)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("modules", &self.names())
            .finish()
    }
}
