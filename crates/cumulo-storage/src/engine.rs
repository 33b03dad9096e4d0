//! Versioned storage engine
//!
//! Two tables: the `source_version` ledger (one row per saved snapshot) and
//! `inventory` (the records of every snapshot). A save batch is one full,
//! internally consistent snapshot per source; the engine assigns each source
//! the next version number and writes ledger and records in one transaction,
//! so readers never observe a partial snapshot.
//!
//! The engine does not serialize concurrent `save` calls against each other.
//! Callers needing same-source mutual exclusion hold a lock around
//! connect → save → disconnect.

use crate::error::{Result, StorageError};
use crate::model::SourceVersion;
use chrono::{DateTime, Duration, Utc};
use cumulo_core::InventoryRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;

const MAX_POOL_CONNECTIONS: u32 = 5;

const CREATE_SOURCE_VERSION: &str = "\
CREATE TABLE IF NOT EXISTS source_version (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  source TEXT NOT NULL,
  timestamp TEXT NOT NULL,
  version INTEGER NOT NULL DEFAULT 1,
  entry_count INTEGER NOT NULL,
  UNIQUE(source, version)
)";

const CREATE_INVENTORY: &str = "\
CREATE TABLE IF NOT EXISTS inventory (
  inventory_id INTEGER PRIMARY KEY AUTOINCREMENT,
  version INTEGER NOT NULL,
  source TEXT NOT NULL,
  type TEXT NOT NULL,
  name TEXT,
  cluster TEXT,
  project TEXT,
  location TEXT,
  id TEXT,
  created TEXT,
  cpus INTEGER,
  memory INTEGER,
  disks INTEGER,
  storage INTEGER,
  primary_ip TEXT,
  os TEXT,
  os_family TEXT,
  status TEXT,
  is_on INTEGER,
  owner TEXT,
  tags TEXT,
  networks TEXT,
  storages TEXT,
  description TEXT,
  attributes TEXT,
  details TEXT,
  UNIQUE(version, source, type, name, cluster, project, id)
)";

const INSERT_INVENTORY: &str = "\
INSERT INTO inventory (
  version, source, type, name, cluster, project, location, id, created,
  cpus, memory, disks, storage, primary_ip, os, os_family, status, is_on,
  owner, tags, networks, storages, description, attributes, details
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const SELECT_INVENTORY: &str = "\
SELECT version, source, type, name, cluster, project, location, id, created,
       cpus, memory, disks, storage, primary_ip, os, os_family, status, is_on,
       owner, tags, networks, storages, description, attributes, details
FROM inventory WHERE source = ? AND version = ? ORDER BY inventory_id";

/// Versioned snapshot store behind an opaque DSN.
pub struct InventoryStorage {
    dsn: String,
    pool: Option<SqlitePool>,
}

impl InventoryStorage {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            pool: None,
        }
    }

    /// Open the connection pool and ensure the schema exists.
    ///
    /// Schema creation is idempotent (`CREATE TABLE IF NOT EXISTS`); the
    /// engine never migrates an existing schema.
    pub async fn connect(&mut self) -> Result<()> {
        let options = SqliteConnectOptions::from_str(&self.dsn)
            .map_err(|e| StorageError::InvalidDsn(e.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_SOURCE_VERSION).execute(&pool).await?;
        sqlx::query(CREATE_INVENTORY).execute(&pool).await?;

        tracing::debug!("storage connected");
        self.pool = Some(pool);
        Ok(())
    }

    /// Release the pool. Safe to call repeatedly; `connect` may follow.
    pub async fn disconnect(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::debug!("storage disconnected");
        }
    }

    fn pool(&self) -> Result<&SqlitePool> {
        self.pool.as_ref().ok_or(StorageError::NotConnected)
    }

    /// Persist one snapshot batch, stamping each record with its source's
    /// next version number.
    ///
    /// Sources already in the ledger get max version + 1, new sources get
    /// version 1. Only sources that produced at least one record this batch
    /// get a ledger row. Ledger and inventory rows are written in a single
    /// transaction. Returns `false` without writing when the batch names no
    /// sources at all.
    pub async fn save(&self, records: &mut [InventoryRecord]) -> Result<bool> {
        let pool = self.pool()?;

        // current max version per source
        let rows = sqlx::query("SELECT source, MAX(version) AS version FROM source_version GROUP BY source")
            .fetch_all(pool)
            .await?;
        let mut versions: HashMap<String, i64> = HashMap::new();
        for row in &rows {
            let source: String = row.try_get("source")?;
            let version: i64 = row.try_get("version")?;
            versions.insert(source, version + 1);
        }

        // stamp records, count entries per source
        let mut entries: HashMap<String, i64> = HashMap::new();
        for rec in records.iter_mut() {
            let version = *versions.entry(rec.source.clone()).or_insert(1);
            rec.version = Some(version);
            *entries.entry(rec.source.clone()).or_insert(0) += 1;
        }

        if entries.is_empty() {
            tracing::debug!("empty batch, nothing to save");
            return Ok(false);
        }

        let now = Utc::now();
        let mut tx = pool.begin().await?;
        for (source, count) in &entries {
            sqlx::query("INSERT INTO source_version (source, timestamp, version, entry_count) VALUES (?, ?, ?, ?)")
                .bind(source)
                .bind(now)
                .bind(versions[source])
                .bind(count)
                .execute(&mut *tx)
                .await?;
        }
        for rec in records.iter() {
            insert_record(&mut tx, rec).await?;
        }
        tx.commit().await?;

        tracing::info!(
            sources = entries.len(),
            records = records.len(),
            "snapshot batch saved"
        );
        Ok(true)
    }

    /// Prune snapshots older than `max_age_days`.
    ///
    /// Deletes ledger and inventory rows per `(source, version)` pair inside
    /// one transaction per cleanup pass. A source's current max version is
    /// never deleted, however old it is. Returns the number of snapshots
    /// removed.
    pub async fn cleanup(&self, max_age_days: i64) -> Result<u64> {
        let pool = self.pool()?;
        let cutoff: DateTime<Utc> = Utc::now() - Duration::days(max_age_days);

        let stale = sqlx::query(
            "SELECT id, source, version FROM source_version AS sv
             WHERE sv.timestamp < ?
               AND sv.version < (SELECT MAX(version) FROM source_version WHERE source = sv.source)",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        if stale.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;
        for row in &stale {
            let ledger_id: i64 = row.try_get("id")?;
            let source: String = row.try_get("source")?;
            let version: i64 = row.try_get("version")?;

            sqlx::query("DELETE FROM inventory WHERE source = ? AND version = ?")
                .bind(&source)
                .bind(version)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM source_version WHERE id = ?")
                .bind(ledger_id)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(source = %source, version, "stale snapshot removed");
        }
        tx.commit().await?;

        tracing::info!(snapshots = stale.len(), "retention cleanup finished");
        Ok(stale.len() as u64)
    }

    /// Records of one snapshot; `None` selects the source's latest version.
    pub async fn load(
        &self,
        source: &str,
        version: Option<i64>,
    ) -> Result<Vec<InventoryRecord>> {
        let pool = self.pool()?;
        let version = match version {
            Some(v) => v,
            None => self
                .latest_version(source)
                .await?
                .ok_or_else(|| StorageError::UnknownSource(source.to_string()))?,
        };

        let rows = sqlx::query(SELECT_INVENTORY)
            .bind(source)
            .bind(version)
            .fetch_all(pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }

    /// Ledger rows of one source, oldest version first.
    pub async fn versions(&self, source: &str) -> Result<Vec<SourceVersion>> {
        let pool = self.pool()?;
        let versions = sqlx::query_as::<_, SourceVersion>(
            "SELECT id, source, timestamp, version, entry_count
             FROM source_version WHERE source = ? ORDER BY version",
        )
        .bind(source)
        .fetch_all(pool)
        .await?;
        Ok(versions)
    }

    /// Current max version of a source, `None` for unknown sources.
    pub async fn latest_version(&self, source: &str) -> Result<Option<i64>> {
        let pool = self.pool()?;
        let version =
            sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM source_version WHERE source = ?")
                .bind(source)
                .fetch_one(pool)
                .await?;
        Ok(version)
    }
}

async fn insert_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    rec: &InventoryRecord,
) -> Result<()> {
    sqlx::query(INSERT_INVENTORY)
        .bind(rec.version)
        .bind(&rec.source)
        .bind(&rec.record_type)
        .bind(&rec.name)
        .bind(&rec.cluster)
        .bind(&rec.project)
        .bind(&rec.location)
        .bind(&rec.id)
        .bind(&rec.created)
        .bind(rec.cpus)
        .bind(rec.memory)
        .bind(rec.disks)
        .bind(rec.storage)
        .bind(&rec.primary_ip)
        .bind(&rec.os)
        .bind(&rec.os_family)
        .bind(&rec.status)
        .bind(rec.is_on)
        .bind(&rec.owner)
        .bind(&rec.tags)
        .bind(&rec.networks)
        .bind(&rec.storages)
        .bind(&rec.description)
        .bind(&rec.attributes)
        .bind(&rec.details)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn record_from_row(row: &SqliteRow) -> Result<InventoryRecord> {
    Ok(InventoryRecord {
        record_type: row.try_get("type")?,
        source: row.try_get("source")?,
        version: row.try_get("version")?,
        name: row.try_get("name")?,
        cluster: row.try_get("cluster")?,
        project: row.try_get("project")?,
        location: row.try_get("location")?,
        description: row.try_get("description")?,
        id: row.try_get("id")?,
        created: row.try_get("created")?,
        cpus: row.try_get("cpus")?,
        memory: row.try_get("memory")?,
        disks: row.try_get("disks")?,
        storage: row.try_get("storage")?,
        primary_ip: row.try_get("primary_ip")?,
        os: row.try_get("os")?,
        os_family: row.try_get("os_family")?,
        status: row.try_get("status")?,
        is_on: row.try_get("is_on")?,
        owner: row.try_get("owner")?,
        tags: row.try_get::<Option<String>, _>("tags")?.unwrap_or_else(|| "[]".to_string()),
        networks: row.try_get::<Option<String>, _>("networks")?.unwrap_or_else(|| "[]".to_string()),
        storages: row.try_get::<Option<String>, _>("storages")?.unwrap_or_else(|| "[]".to_string()),
        attributes: row.try_get("attributes")?,
        details: row.try_get("details")?,
    })
}
