//! Collector orchestration
//!
//! One [`Orchestrator`] drives one provider collection run: establish the
//! session, propagate it to every resource collector in fetch order, fetch
//! the dependency bucket to completion, fetch the primary bucket, run the
//! provider's own primary fetch, and log out on every exit path.
//!
//! Fan-out within a bucket is parallel but bounded ([`CollectorOptions`]);
//! the bucket boundary is a strict barrier. Cancellation aborts outstanding
//! fetches and still logs out.

use crate::error::{CollectError, Result};
use crate::registry::ResourceRegistry;
use crate::resolver::resolve;
use crate::resource::{ProviderCollector, ResourceCollector, Session};
use crate::store::{CachedResource, ResourceData};
use cumulo_core::InventoryRecord;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Default parallel fetch width within a bucket
pub const DEFAULT_WORKERS: usize = 4;

/// Hard cap on the fetch width, whatever the configuration says
pub const MAX_WORKERS: usize = 32;

/// Per-run orchestration options
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Parallel fetches per bucket, clamped to `1..=MAX_WORKERS`
    pub max_workers: usize,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_WORKERS,
        }
    }
}

impl CollectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn workers(&self) -> usize {
        self.max_workers.clamp(1, MAX_WORKERS)
    }
}

/// Run lifecycle of one provider collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LoggedIn,
    Fetching,
    LoggedOut,
    Done,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::LoggedIn => write!(f, "logged_in"),
            RunState::Fetching => write!(f, "fetching"),
            RunState::LoggedOut => write!(f, "logged_out"),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Drives one provider collection run
pub struct Orchestrator {
    provider: Box<dyn ProviderCollector>,
    registry: Arc<ResourceRegistry>,
    requested: Vec<String>,
    options: CollectorOptions,
    data: ResourceData,
    cancel: CancellationToken,
    state: RunState,
}

impl Orchestrator {
    pub fn new(
        provider: Box<dyn ProviderCollector>,
        registry: Arc<ResourceRegistry>,
        requested: Vec<String>,
        options: CollectorOptions,
    ) -> Self {
        Self {
            provider,
            registry,
            requested,
            options,
            data: ResourceData::new(),
            cancel: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Token callers hold to abort the run; logout still executes.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Shared per-run resource-data store
    pub fn data(&self) -> &ResourceData {
        &self.data
    }

    /// Cached output of a resource collector, if fetched this run
    pub fn resource_data(&self, resource_type: &str) -> Option<CachedResource> {
        self.data.get(resource_type)
    }

    /// Override a resource collector's cached output
    pub fn set_resource_data(&self, resource_type: impl Into<String>, cached: CachedResource) {
        self.data.set(resource_type, cached);
    }

    /// Invalidate a resource collector's cached output
    pub fn delete_resource_data(&self, resource_type: &str) -> Option<CachedResource> {
        self.data.delete(resource_type)
    }

    /// Execute the full collection cycle and return the aggregated records.
    pub async fn run(&mut self) -> Result<Vec<InventoryRecord>> {
        let span = tracing::info_span!("collect", provider = %self.provider.name());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&mut self) -> Result<Vec<InventoryRecord>> {
        let provider = self.provider.name().to_string();

        let session = match self.provider.login().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.state = RunState::Failed;
                tracing::error!("provider returned an empty session");
                return Err(CollectError::LoginFailed(provider, "empty session".to_string()));
            }
            Err(e) => {
                self.state = RunState::Failed;
                return Err(CollectError::LoginFailed(provider, e.to_string()));
            }
        };
        self.state = RunState::LoggedIn;
        tracing::info!("logged in");

        let result = self.fetch_all(session).await;

        // logout runs on every exit path, fetch errors included
        self.provider.logout().await;
        self.state = RunState::LoggedOut;
        tracing::info!("logged out");

        match result {
            Ok(records) => {
                self.state = RunState::Done;
                tracing::info!(records = records.len(), "collection finished");
                Ok(records)
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(e)
            }
        }
    }

    async fn fetch_all(&mut self, session: Session) -> Result<Vec<InventoryRecord>> {
        self.state = RunState::Fetching;

        let declared = self.provider.dependencies();
        let plan = resolve(&declared, &self.requested);
        tracing::debug!(
            dependencies = ?plan.dependencies,
            primary = ?plan.primary,
            "fetch plan resolved"
        );

        // Instantiate and bind in fetch order. Unknown resource types are
        // skipped; a session rejection aborts the run.
        let mut dependency_collectors = Vec::new();
        let mut primary_collectors = Vec::new();
        for name in plan.iter() {
            let mut collector = match self.registry.create(name) {
                Ok(collector) => collector,
                Err(CollectError::UnknownResource(_)) => {
                    tracing::warn!(resource = %name, "no collector registered, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            collector
                .login(session.clone())
                .map_err(|e| CollectError::SessionPropagation(name.clone(), e.to_string()))?;
            if plan.is_dependency(name) {
                dependency_collectors.push(collector);
            } else {
                primary_collectors.push(collector);
            }
        }

        let mut output = Vec::new();

        // phase 1: dependency bucket, cached only — strict barrier
        self.fetch_bucket(dependency_collectors, None).await?;

        // phase 2: primary bucket, cached and appended
        self.fetch_bucket(primary_collectors, Some(&mut output)).await?;

        // phase 3: provider primary fetch, may read cached dependency data
        if self.cancel.is_cancelled() {
            return Err(CollectError::Cancelled);
        }
        let primary = tokio::select! {
            _ = self.cancel.cancelled() => return Err(CollectError::Cancelled),
            res = self.provider.fetch(&self.data) => res,
        };
        match primary {
            Ok(records) => {
                tracing::debug!(count = records.len(), "primary fetch finished");
                output.extend(records);
                Ok(output)
            }
            Err(e) => {
                tracing::error!(error = %e, "primary fetch failed");
                Err(e)
            }
        }
    }

    /// Fetch one bucket with bounded parallelism. Results are cached in the
    /// shared store; `output` additionally collects them for primary-bucket
    /// collectors. The first failure cancels the remaining fetches.
    async fn fetch_bucket(
        &mut self,
        collectors: Vec<Box<dyn ResourceCollector>>,
        mut output: Option<&mut Vec<InventoryRecord>>,
    ) -> Result<()> {
        if collectors.is_empty() {
            return Ok(());
        }

        let semaphore = Arc::new(Semaphore::new(self.options.workers()));
        let mut tasks = JoinSet::new();
        for mut collector in collectors {
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let name = collector.resource_type().to_string();
            tasks.spawn(async move {
                let permit = semaphore.acquire_owned().await;
                if permit.is_err() || cancel.is_cancelled() {
                    return (name, None, Err(CollectError::Cancelled));
                }
                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(CollectError::Cancelled),
                    res = collector.fetch() => {
                        res.map_err(|e| CollectError::FetchFailed(name.clone(), e.to_string()))
                    }
                };
                (name, collector.raw_data(), result)
            });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, raw, Ok(records))) => {
                    tracing::debug!(resource = %name, count = records.len(), "resource fetched");
                    if let Some(out) = output.as_mut() {
                        out.extend(records.clone());
                    }
                    self.data.set(name, CachedResource { records, raw });
                }
                Ok((name, _, Err(e))) => {
                    if first_error.is_none() {
                        tracing::error!(resource = %name, error = %e, "resource fetch failed");
                        first_error = Some(e);
                        // fail fast: stop the remaining fetches in the run
                        self.cancel.cancel();
                    }
                }
                Err(join_error) => {
                    if first_error.is_none() {
                        first_error = Some(CollectError::TaskFailed(join_error.to_string()));
                        self.cancel.cancel();
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
