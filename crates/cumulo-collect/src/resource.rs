//! Collector plugin protocol
//!
//! Two trait boundaries:
//!
//! - [`ProviderCollector`]: one per cloud account. Owns the session
//!   lifecycle and the provider's primary resource fetch (virtual machines,
//!   typically).
//! - [`ResourceCollector`]: one per resource kind within a provider (block
//!   storage volumes, load balancers, ...). Instances are created by the
//!   resource registry and bound to the provider session before fetching.

use crate::error::Result;
use crate::store::ResourceData;
use async_trait::async_trait;
use cumulo_core::InventoryRecord;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Opaque shared session handle minted by a provider at login.
///
/// Resource collectors downcast it to the provider's concrete client type;
/// the core never looks inside.
pub type Session = Arc<dyn Any + Send + Sync>;

/// Fetch logic for one resource kind within a provider.
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    /// Resource type name this collector is registered under
    fn resource_type(&self) -> &str;

    /// Bind the shared provider session.
    ///
    /// Client construction only — no network calls. Idempotent per login
    /// cycle.
    fn login(&mut self, session: Session) -> Result<()>;

    /// Query the provider and return normalized records.
    ///
    /// Pagination must be fully drained before returning. The returned list
    /// replaces any previously cached data for this resource type.
    async fn fetch(&mut self) -> Result<Vec<InventoryRecord>>;

    /// Raw per-entity data for collectors whose output feeds sibling
    /// collectors (dependency producers). `None` for ordinary collectors.
    fn raw_data(&self) -> Option<Value> {
        None
    }
}

/// One cloud account: session lifecycle plus the primary resource fetch.
#[async_trait]
pub trait ProviderCollector: Send + Sync {
    /// Logical source name (stamped into records by the provider)
    fn name(&self) -> &str;

    /// Resource types the primary fetch needs resolved before it runs
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Establish the provider session.
    ///
    /// `Ok(None)` signals a refused login (empty session) and fails the run
    /// the same way an error does.
    async fn login(&mut self) -> Result<Option<Session>>;

    /// Fetch the provider's primary resources.
    ///
    /// Runs after every requested resource collector has completed; cached
    /// dependency data is available through `data`.
    async fn fetch(&mut self, data: &ResourceData) -> Result<Vec<InventoryRecord>>;

    /// Release the session. Runs on every exit path, success or error.
    async fn logout(&mut self);
}
