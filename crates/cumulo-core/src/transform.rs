//! Shared provider transforms
//!
//! Small helpers every provider needs a version of. They are plain functions
//! composed into provider implementations, not a base class to inherit from.

use serde_json::Value;
use std::collections::HashMap;

/// Flatten a provider tag list (`[{key: ..., value: ...}, ...]`) into a map.
///
/// Field names vary per provider (`Key`/`Value` on AWS, `key`/`value` on
/// Lightsail), so they are parameters. Entries without a key are skipped;
/// a missing value maps to `null`.
pub fn tags_from_pairs(items: &[Value], key_field: &str, value_field: &str) -> serde_json::Map<String, Value> {
    let mut tags = serde_json::Map::new();
    for item in items {
        let Some(key) = item.get(key_field).and_then(Value::as_str) else {
            continue;
        };
        tags.insert(
            key.to_string(),
            item.get(value_field).cloned().unwrap_or(Value::Null),
        );
    }
    tags
}

/// Providers report disk and memory sizes in GiB; records carry MiB.
pub fn mib_from_gib(gib: i64) -> i64 {
    gib * 1024
}

/// Memo map for per-run catalog lookups (instance types, machine shapes).
///
/// Collectors resolve a type once against the provider API and reuse the
/// result for every record of the run.
#[derive(Debug, Default)]
pub struct LookupCache<V> {
    entries: HashMap<String, V>,
}

impl<V> LookupCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) -> &V {
        let key = key.into();
        self.entries.entry(key).or_insert(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
