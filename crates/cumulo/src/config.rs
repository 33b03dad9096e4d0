//! Service configuration
//!
//! Typed configuration for one inventory deployment: the storage DSN and a
//! map of configured collector accounts. How the values got here (file,
//! environment, embedding application) is not this crate's concern.

use cumulo_collect::CollectorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Opaque DSN handed to the storage engine
    pub dsn: String,
}

/// One configured collector account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorEntry {
    /// Provider module key in the provider registry
    pub module: String,

    /// Provider-specific payload (credentials, endpoints)
    #[serde(default)]
    pub config: Value,

    /// Defaults merged under every record's attributes
    #[serde(default, rename = "default")]
    pub defaults: serde_json::Map<String, Value>,

    /// Resource types to collect alongside the primary fetch
    #[serde(default)]
    pub collect: Vec<String>,

    /// Disabled collectors are listed but never run
    #[serde(default)]
    pub disabled: bool,
}

impl CollectorEntry {
    /// Bind this entry to its account name for the collect layer.
    pub fn to_collector_config(&self, name: &str) -> CollectorConfig {
        CollectorConfig::new(name, &self.module)
            .with_config(self.config.clone())
            .with_defaults(self.defaults.clone())
            .with_collect(self.collect.clone())
    }
}

/// Full service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub storage: StorageConfig,

    /// Collector accounts keyed by source name
    #[serde(default)]
    pub collectors: HashMap<String, CollectorEntry>,
}
