//! Collector configuration
//!
//! One [`CollectorConfig`] describes a configured provider account: which
//! provider module to load, the opaque provider payload (credentials,
//! endpoints — never inspected here), record defaults, and the resource
//! types the caller wants collected. Configuration is passed at
//! construction; nothing in this crate reads process-global state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for one collector account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Logical source name, stamped into every record
    pub name: String,

    /// Provider module key in the provider registry
    pub module: String,

    /// Provider-specific configuration payload (opaque to the core)
    #[serde(default)]
    pub config: Value,

    /// Defaults merged under every record's attributes
    #[serde(default, rename = "default")]
    pub defaults: serde_json::Map<String, Value>,

    /// Resource types to collect in addition to the provider's primary fetch
    #[serde(default)]
    pub collect: Vec<String>,

    /// Disabled collectors are listed but never run
    #[serde(default)]
    pub disabled: bool,
}

impl CollectorConfig {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            config: Value::Null,
            defaults: serde_json::Map::new(),
            collect: Vec::new(),
            disabled: false,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_defaults(mut self, defaults: serde_json::Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_collect(mut self, collect: Vec<String>) -> Self {
        self.collect = collect;
        self
    }

    /// Get a provider payload value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
