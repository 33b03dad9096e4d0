//! Cumulo Collect
//!
//! Provider-agnostic collection machinery:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Orchestrator                      │
//! │  login ─▶ propagate session ─▶ fetch ─▶ logout    │
//! └───────┬──────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐   ┌────────────────┐
//! │   Resolver    │   │    Registry     │
//! │ (fetch order) │   │ (type→factory)  │
//! └───────┬───────┘   └───────┬────────┘
//!         │                   │
//! ┌───────▼───────────────────▼────────┐
//! │        Resource Collectors          │
//! │  (fan-out, shared ResourceData)     │
//! └────────────────────────────────────┘
//! ```
//!
//! Providers implement [`ProviderCollector`] and a set of
//! [`ResourceCollector`]s; everything else lives here.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod resource;
pub mod store;

// Re-exports
pub use config::CollectorConfig;
pub use error::{CollectError, Result};
pub use orchestrator::{CollectorOptions, Orchestrator, RunState};
pub use registry::{ProviderRegistry, ResourceRegistry};
pub use resolver::{FetchPlan, resolve};
pub use resource::{ProviderCollector, ResourceCollector, Session};
pub use store::{CachedResource, ResourceData};
