//! Record normalization
//!
//! [`RecordBuilder`] converts the raw attribute map a collector assembled
//! into an [`InventoryRecord`]: collector defaults are merged under the
//! caller's attributes (caller wins), a fixed set of keys is lifted into
//! typed columns, structured columns are JSON-encoded, and whatever is left
//! lands in the `attributes` bag.

use crate::error::Result;
use crate::model::{Attrs, InventoryRecord, is_falsy};
use crate::platform;
use serde_json::Value;

/// Builds normalized records for one collector.
///
/// The builder is bound to a source name and a `defaults` map applied under
/// every record's attributes.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    source: String,
    defaults: Attrs,
}

impl RecordBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            defaults: Attrs::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: Attrs) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Produce a normalized record from raw collector attributes.
    ///
    /// `details` is the untouched provider payload and is stored verbatim
    /// as JSON for forensic use.
    pub fn build(&self, record_type: &str, attrs: Attrs, details: &Value) -> Result<InventoryRecord> {
        let mut attrs = {
            let mut merged = self.defaults.clone();
            merged.extend(attrs);
            merged
        };

        // os_family present in the input marks an explicit classification;
        // remember before lifting consumes the key.
        let os_family_supplied = attrs.get("os_family").is_some_and(|v| !is_falsy(v));

        let mut rec = InventoryRecord {
            record_type: record_type.to_string(),
            source: self.source.clone(),
            version: None,
            name: take_string(&mut attrs, "name")?,
            cluster: take_string(&mut attrs, "cluster")?,
            project: take_string(&mut attrs, "project")?,
            location: take_string(&mut attrs, "location")?,
            description: take_string(&mut attrs, "description")?,
            id: take_string(&mut attrs, "id")?,
            created: take_string(&mut attrs, "created")?,
            cpus: take_i64(&mut attrs, "cpus"),
            memory: take_i64(&mut attrs, "memory"),
            disks: take_i64(&mut attrs, "disks"),
            storage: take_i64(&mut attrs, "storage"),
            primary_ip: take_string(&mut attrs, "primary_ip")?,
            os: take_string(&mut attrs, "os")?,
            os_family: take_string(&mut attrs, "os_family")?,
            status: take_string(&mut attrs, "status")?,
            is_on: take_bool(&mut attrs, "is_on"),
            owner: take_string(&mut attrs, "owner")?,
            tags: take_json(&mut attrs, "tags")?,
            networks: take_json(&mut attrs, "networks")?,
            storages: take_json(&mut attrs, "storages")?,
            attributes: None,
            details: None,
        };

        if let Some(os) = rec.os.clone() {
            if !os_family_supplied {
                rec.os_family =
                    Some(platform::os_family(&os, rec.description.as_deref()).to_string());
            }
            rec.os = Some(platform::os_label(&os, rec.description.as_deref()));
        }

        if !attrs.is_empty() {
            rec.attributes = Some(serde_json::to_string(&attrs)?);
        }
        rec.details = Some(serde_json::to_string(details)?);

        Ok(rec)
    }
}

fn take_string(attrs: &mut Attrs, key: &str) -> Result<Option<String>> {
    match attrs.get(key) {
        Some(v) if !is_falsy(v) => {
            let value = attrs.remove(key).unwrap_or(Value::Null);
            Ok(Some(value_to_string(value)?))
        }
        _ => Ok(None),
    }
}

fn take_i64(attrs: &mut Attrs, key: &str) -> Option<i64> {
    match attrs.get(key) {
        Some(v) if !is_falsy(v) => {
            let value = attrs.remove(key)?;
            match value {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }
        }
        _ => None,
    }
}

fn take_bool(attrs: &mut Attrs, key: &str) -> Option<bool> {
    match attrs.get(key) {
        // The truthiness rule filters out explicit 0/false, so a lifted
        // value is always true. Kept as a real conversion anyway.
        Some(v) if !is_falsy(v) => {
            let value = attrs.remove(key)?;
            match value {
                Value::Bool(b) => Some(b),
                Value::Number(n) => Some(n.as_f64() != Some(0.0)),
                Value::String(s) => Some(!s.is_empty()),
                _ => Some(true),
            }
        }
        _ => None,
    }
}

fn take_json(attrs: &mut Attrs, key: &str) -> Result<String> {
    match attrs.get(key) {
        Some(v) if !is_falsy(v) => {
            let value = attrs.remove(key).unwrap_or(Value::Null);
            Ok(serde_json::to_string(&value)?)
        }
        _ => Ok("[]".to_string()),
    }
}

/// Scalars pass through as strings; maps and sequences are JSON-serialized
/// (some providers report composite health/zone data in `cluster`/`status`).
fn value_to_string(value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Ok(serde_json::to_string(&other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attrs {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn lifts_fixed_keys_and_defaults_json_columns() {
        let builder = RecordBuilder::new("acct1");
        let rec = builder
            .build("vm", attrs(json!({"name": "x", "tags": {"a": "b"}})), &json!({}))
            .unwrap();

        assert_eq!(rec.name.as_deref(), Some("x"));
        assert_eq!(rec.tags, r#"{"a":"b"}"#);
        assert_eq!(rec.networks, "[]");
        assert_eq!(rec.storages, "[]");
        assert_eq!(rec.attributes, None);
        assert_eq!(rec.source, "acct1");
        assert_eq!(rec.record_type, "vm");
        assert_eq!(rec.version, None);
    }

    #[test]
    fn caller_attrs_win_over_defaults() {
        let builder = RecordBuilder::new("acct1")
            .with_defaults(attrs(json!({"owner": "infra", "project": "base"})));
        let rec = builder
            .build("vm", attrs(json!({"project": "edge"})), &json!({}))
            .unwrap();

        assert_eq!(rec.owner.as_deref(), Some("infra"));
        assert_eq!(rec.project.as_deref(), Some("edge"));
    }

    #[test]
    fn residual_attrs_become_attributes_bag() {
        let builder = RecordBuilder::new("acct1");
        let rec = builder
            .build(
                "vm",
                attrs(json!({"name": "web-1", "zone_redundant": true})),
                &json!({}),
            )
            .unwrap();

        let bag: Value = serde_json::from_str(rec.attributes.as_deref().unwrap()).unwrap();
        assert_eq!(bag, json!({"zone_redundant": true}));
    }

    #[test]
    fn composite_cluster_and_status_are_json_encoded() {
        let builder = RecordBuilder::new("acct1");
        let rec = builder
            .build(
                "elb",
                attrs(json!({
                    "cluster": ["eu-west-1a", "eu-west-1b"],
                    "status": {"i-1": {"state": "InService"}},
                })),
                &json!({}),
            )
            .unwrap();

        assert_eq!(rec.cluster.as_deref(), Some(r#"["eu-west-1a","eu-west-1b"]"#));
        assert_eq!(
            rec.status.as_deref(),
            Some(r#"{"i-1":{"state":"InService"}}"#)
        );
    }

    #[test]
    fn os_family_derived_when_not_supplied() {
        let builder = RecordBuilder::new("acct1");
        let rec = builder
            .build("vm", attrs(json!({"os": "Ubuntu 20.04"})), &json!({}))
            .unwrap();
        assert_eq!(rec.os_family.as_deref(), Some("Linux"));
        assert_eq!(rec.os.as_deref(), Some("Ubuntu 20.04"));

        let rec = builder
            .build(
                "vm",
                attrs(json!({"os": "Ubuntu 20.04", "description": "RouterOS v6"})),
                &json!({}),
            )
            .unwrap();
        assert_eq!(rec.os_family.as_deref(), Some("RouterOS"));
        assert_eq!(rec.os.as_deref(), Some("RouterOS/Linux"));
    }

    #[test]
    fn explicit_os_family_is_kept() {
        let builder = RecordBuilder::new("acct1");
        let rec = builder
            .build(
                "vm",
                attrs(json!({"os": "Ubuntu 20.04", "os_family": "Appliance"})),
                &json!({}),
            )
            .unwrap();
        assert_eq!(rec.os_family.as_deref(), Some("Appliance"));
    }

    #[test]
    fn falsy_values_are_not_lifted() {
        let builder = RecordBuilder::new("acct1");
        let rec = builder
            .build(
                "vm",
                attrs(json!({"cpus": 0, "name": "", "is_on": false})),
                &json!({}),
            )
            .unwrap();
        assert_eq!(rec.cpus, None);
        assert_eq!(rec.name, None);
        assert_eq!(rec.is_on, None);
    }

    #[test]
    fn details_hold_the_raw_payload() {
        let builder = RecordBuilder::new("acct1");
        let raw = json!({"InstanceId": "i-1", "CreateTime": "2024-05-01 10:00:00"});
        let rec = builder.build("vm", Attrs::new(), &raw).unwrap();

        let details: Value = serde_json::from_str(rec.details.as_deref().unwrap()).unwrap();
        assert_eq!(details, raw);
    }
}
