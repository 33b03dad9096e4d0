//! Storage-side models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the source-version ledger.
///
/// A row exists per `(source, version)` snapshot; the maximum version of a
/// source plus one is the version assigned to its next save batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceVersion {
    pub id: i64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub version: i64,
    pub entry_count: i64,
}
