//! Canonical inventory record model
//!
//! One [`InventoryRecord`] is produced per cloud object per collection run.
//! Records are created by [`crate::RecordBuilder`], never mutated afterwards
//! (storage stamps the `version` field at save time), and deleted only by
//! retention cleanup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw attribute map handed to the record builder by a collector.
pub type Attrs = serde_json::Map<String, Value>;

/// The normalized, provider-agnostic unit of inventory data.
///
/// Fixed scalar columns are `None` when the provider did not report them.
/// `networks`, `storages` and `tags` always hold a JSON array/object literal
/// (`"[]"` when absent). `attributes` collects every provider-specific field
/// that did not map to a fixed column; `details` holds the full raw payload.
///
/// Uniqueness invariant within storage:
/// `(version, source, type, name, cluster, project, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Resource kind tag (`vm`, `ebs`, `elb`, ...)
    #[serde(rename = "type")]
    pub record_type: String,

    /// Logical collector/account name that produced the record
    pub source: String,

    /// Snapshot version, assigned by storage at save time
    pub version: Option<i64>,

    pub name: Option<String>,
    pub cluster: Option<String>,
    pub project: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub id: Option<String>,
    pub created: Option<String>,

    pub cpus: Option<i64>,
    pub memory: Option<i64>,
    pub disks: Option<i64>,
    pub storage: Option<i64>,

    pub primary_ip: Option<String>,

    pub os: Option<String>,
    pub os_family: Option<String>,

    pub status: Option<String>,
    pub is_on: Option<bool>,

    pub owner: Option<String>,

    /// JSON-encoded structured columns, `"[]"` when absent
    pub tags: String,
    pub networks: String,
    pub storages: String,

    /// JSON bag of unmapped provider-specific fields, `None` when empty
    pub attributes: Option<String>,

    /// JSON-encoded full raw provider payload
    pub details: Option<String>,
}

/// Attribute presence rule: `null`, `""`, `0`, `false` and empty containers
/// all count as absent when lifting fixed columns and JSON defaults.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
