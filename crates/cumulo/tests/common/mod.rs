//! Mock cloud provider for pipeline tests
//!
//! A small in-memory "cloud" with instances, volumes and load balancers,
//! exposed through the same provider/resource boundaries a real module
//! implements.

use async_trait::async_trait;
use cumulo::{
    CollectorConfig, InventoryConfig, ProviderCollector, ProviderRegistry, ResourceCollector,
    ResourceData, ResourceRegistry, Session,
};
use cumulo_collect::{CollectError, Result};
use cumulo_core::transform::{LookupCache, mib_from_gib, tags_from_pairs};
use cumulo_core::{InventoryRecord, RecordBuilder};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

const PAGE_SIZE: usize = 2;

/// Canned provider API payloads
pub struct MockApi {
    pub instances: Vec<Value>,
    pub volumes: Vec<Value>,
    pub balancers: Vec<Value>,
}

impl MockApi {
    pub fn small_fleet() -> Self {
        Self {
            instances: vec![
                json!({
                    "InstanceId": "i-1", "KeyName": "web-1", "InstanceType": "t3.micro",
                    "Placement": {"AvailabilityZone": "eu-west-1a"},
                    "State": {"Name": "running"}, "Platform": "Ubuntu 22.04",
                    "PrivateIpAddress": "10.0.0.11",
                    "Tags": [{"Key": "env", "Value": "test"}],
                }),
                json!({
                    "InstanceId": "i-2", "KeyName": "db-1", "InstanceType": "t3.large",
                    "Placement": {"AvailabilityZone": "eu-west-1b"},
                    "State": {"Name": "stopped"}, "Platform": "Ubuntu 22.04",
                    "PrivateIpAddress": "10.0.0.12",
                    "Tags": [],
                }),
            ],
            volumes: vec![
                json!({
                    "VolumeId": "vol-1", "Size": 20, "VolumeType": "gp3",
                    "AvailabilityZone": "eu-west-1a",
                    "Attachments": [{"InstanceId": "i-1", "Device": "/dev/sda1"}],
                }),
                json!({
                    "VolumeId": "vol-2", "Size": 100, "VolumeType": "gp3",
                    "AvailabilityZone": "eu-west-1b",
                    "Attachments": [{"InstanceId": "i-2", "Device": "/dev/sda1"}],
                }),
                json!({
                    "VolumeId": "vol-3", "Size": 50, "VolumeType": "st1",
                    "AvailabilityZone": "eu-west-1b",
                    "Attachments": [{"InstanceId": "i-2", "Device": "/dev/sdb1"}],
                }),
            ],
            balancers: vec![json!({
                "LoadBalancerName": "lb-1",
                "CanonicalHostedZoneNameID": "Z1",
                "AvailabilityZones": ["eu-west-1a", "eu-west-1b"],
                "InstanceHealth": {"i-1": {"state": "InService"}},
                "Tags": [{"Key": "env", "Value": "test"}],
            })],
        }
    }
}

/// Session handle resource collectors downcast to
pub struct MockSession {
    pub api: Arc<MockApi>,
    pub account: String,
}

fn downcast(session: &Session) -> Result<Arc<MockSession>> {
    session
        .clone()
        .downcast::<MockSession>()
        .map_err(|_| CollectError::ApiError("unexpected session type".to_string()))
}

/// Block-storage volumes; a dependency producer keyed by instance id
pub struct EbsCollector {
    session: Option<Arc<MockSession>>,
    raw: Option<Value>,
}

impl EbsCollector {
    pub fn new() -> Self {
        Self {
            session: None,
            raw: None,
        }
    }
}

#[async_trait]
impl ResourceCollector for EbsCollector {
    fn resource_type(&self) -> &str {
        "ebs"
    }

    fn login(&mut self, session: Session) -> Result<()> {
        self.session = Some(downcast(&session)?);
        Ok(())
    }

    async fn fetch(&mut self) -> Result<Vec<InventoryRecord>> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| CollectError::ApiError("not logged in".to_string()))?;
        let builder = RecordBuilder::new(&session.account);

        let mut records = Vec::new();
        let mut per_instance = serde_json::Map::new();
        // page through the volume listing the way a real API forces us to
        for page in session.api.volumes.chunks(PAGE_SIZE) {
            for volume in page {
                let size_gib = volume.get("Size").and_then(Value::as_i64).unwrap_or(0);
                let capacity = mib_from_gib(size_gib);

                for attachment in volume
                    .get("Attachments")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    let Some(instance_id) =
                        attachment.get("InstanceId").and_then(Value::as_str)
                    else {
                        continue;
                    };
                    let entry = per_instance
                        .entry(instance_id)
                        .or_insert_with(|| json!({"storage": 0, "disks": 0}));
                    entry["storage"] = json!(entry["storage"].as_i64().unwrap_or(0) + capacity);
                    entry["disks"] = json!(entry["disks"].as_i64().unwrap_or(0) + 1);
                }

                let attrs = json!({
                    "id": volume.get("VolumeId"),
                    "cluster": volume.get("AvailabilityZone"),
                    "storage": capacity,
                    "volume_type": volume.get("VolumeType"),
                })
                .as_object()
                .cloned()
                .unwrap_or_default();
                records.push(builder.build("ebs", attrs, volume)?);
            }
        }

        self.raw = Some(Value::Object(per_instance));
        Ok(records)
    }

    fn raw_data(&self) -> Option<Value> {
        self.raw.clone()
    }
}

/// Load balancers; reports composite health data in `status`
pub struct ElbCollector {
    session: Option<Arc<MockSession>>,
}

impl ElbCollector {
    pub fn new() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl ResourceCollector for ElbCollector {
    fn resource_type(&self) -> &str {
        "elb"
    }

    fn login(&mut self, session: Session) -> Result<()> {
        self.session = Some(downcast(&session)?);
        Ok(())
    }

    async fn fetch(&mut self) -> Result<Vec<InventoryRecord>> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| CollectError::ApiError("not logged in".to_string()))?;
        let builder = RecordBuilder::new(&session.account);

        let mut records = Vec::new();
        for balancer in &session.api.balancers {
            let tags = tags_from_pairs(
                balancer
                    .get("Tags")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
                "Key",
                "Value",
            );
            let attrs = json!({
                "name": balancer.get("LoadBalancerName"),
                "id": balancer.get("CanonicalHostedZoneNameID"),
                "cluster": balancer.get("AvailabilityZones"),
                "status": balancer.get("InstanceHealth"),
                "tags": tags,
            })
            .as_object()
            .cloned()
            .unwrap_or_default();
            records.push(builder.build("elb", attrs, balancer)?);
        }
        Ok(records)
    }
}

/// The provider: primary fetch produces `vm` records enriched with cached
/// volume data, and re-emits requested dependency resources.
pub struct MockProvider {
    api: Arc<MockApi>,
    config: CollectorConfig,
    session: Option<Arc<MockSession>>,
}

impl MockProvider {
    pub fn new(api: Arc<MockApi>, config: CollectorConfig) -> Self {
        Self {
            api,
            config,
            session: None,
        }
    }

    fn instance_shape(cache: &mut LookupCache<(i64, i64)>, instance_type: &str) -> (i64, i64) {
        if let Some(shape) = cache.get(instance_type) {
            return *shape;
        }
        let shape = match instance_type {
            "t3.micro" => (2, 1024),
            "t3.large" => (2, 8192),
            _ => (1, 512),
        };
        *cache.insert(instance_type, shape)
    }
}

#[async_trait]
impl ProviderCollector for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["ebs".to_string()]
    }

    async fn login(&mut self) -> Result<Option<Session>> {
        if self.config.get_config::<bool>("refuse_login").unwrap_or(false) {
            return Ok(None);
        }
        let session = Arc::new(MockSession {
            api: self.api.clone(),
            account: self.config.name.clone(),
        });
        self.session = Some(session.clone());
        Ok(Some(session as Session))
    }

    async fn fetch(&mut self, data: &ResourceData) -> Result<Vec<InventoryRecord>> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| CollectError::ApiError("not logged in".to_string()))?;
        let builder =
            RecordBuilder::new(&session.account).with_defaults(self.config.defaults.clone());
        let volume_summary = data.raw("ebs").unwrap_or_else(|| json!({}));
        let mut shapes: LookupCache<(i64, i64)> = LookupCache::new();

        let mut records = Vec::new();
        for instance in &session.api.instances {
            let instance_id = instance.get("InstanceId").and_then(Value::as_str).unwrap_or("");
            let instance_type = instance
                .get("InstanceType")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let (cpus, memory) = Self::instance_shape(&mut shapes, instance_type);
            let state = instance
                .get("State")
                .and_then(|s| s.get("Name"))
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let summary = volume_summary.get(instance_id);

            let tags = tags_from_pairs(
                instance
                    .get("Tags")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
                "Key",
                "Value",
            );
            let attrs = json!({
                "name": instance.get("KeyName"),
                "id": instance_id,
                "cluster": instance.get("Placement").and_then(|p| p.get("AvailabilityZone")),
                "cpus": cpus,
                "memory": memory,
                "disks": summary.and_then(|s| s.get("disks")),
                "storage": summary.and_then(|s| s.get("storage")),
                "primary_ip": instance.get("PrivateIpAddress"),
                "os": instance.get("Platform"),
                "status": state,
                "is_on": state == "running",
                "instance_type": instance_type,
                "tags": tags,
            })
            .as_object()
            .cloned()
            .unwrap_or_default();
            records.push(builder.build("vm", attrs, instance)?);
        }

        // requested dependency resources are part of the caller's output
        for resource in &self.config.collect {
            if resource != "ebs" {
                continue;
            }
            if let Some(cached) = data.records(resource) {
                records.extend(cached);
            }
        }

        Ok(records)
    }

    async fn logout(&mut self) {
        self.session = None;
    }
}

/// Registries wired for the mock provider
pub fn registries(api: Arc<MockApi>) -> (ProviderRegistry, ResourceRegistry) {
    let mut providers = ProviderRegistry::new();
    providers.register("mock", move |config| {
        Ok(Box::new(MockProvider::new(api.clone(), config)) as Box<dyn ProviderCollector>)
    });

    let mut resources = ResourceRegistry::new();
    resources.register("ebs", || Box::new(EbsCollector::new()));
    resources.register("elb", || Box::new(ElbCollector::new()));

    (providers, resources)
}

/// Service configuration against a scratch SQLite file
pub fn test_config(dir: &TempDir) -> InventoryConfig {
    serde_json::from_value(json!({
        "storage": {"dsn": format!("sqlite://{}/inventory.db", dir.path().display())},
        "collectors": {
            "acct1": {
                "module": "mock",
                "default": {"owner": "infra"},
                "collect": ["ebs", "elb"],
            },
            "acct2": {"module": "mock", "disabled": true},
        },
    }))
    .unwrap()
}
