//! TTL Key-Value Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::KeyValueStore,
    time::{Clock, SystemClock},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL,
        expires_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed key-value store with per-record expiry
///
/// Every row carries an absolute `expires_at` (Unix seconds). Reads filter
/// out expired rows, so an expired record behaves exactly like a missing one
/// even before [`SqliteKeyValueStore::purge_expired`] removes it.
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteKeyValueStore {
    /// Open (or create) a store from a `sqlite://` connection string
    ///
    /// `sqlite::memory:` is accepted and behaves like [`Self::in_memory`].
    pub async fn connect(url: &str) -> Result<Self> {
        if url.trim() == "sqlite::memory:" {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| BridgeError::DatabaseError(format!("Invalid SQLite URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        let store = Self::with_pool(pool).await?;
        info!(url = url, "Opened SQLite key-value store");
        Ok(store)
    }

    /// Open (or create) a store at the given file path
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(BridgeError::Io)?;
            }
        }

        // SQLite URLs want forward slashes on every platform
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        Self::connect(&format!("sqlite://{}", path_str)).await
    }

    /// Create an in-memory store (for testing and single-process dev hosts)
    pub async fn in_memory() -> Result<Self> {
        // One pinned connection, otherwise each pooled connection gets its
        // own empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        Ok(Self {
            pool,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source used for expiry decisions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Physically delete every expired row
    ///
    /// Returns the number of rows removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM kv_store WHERE expires_at <= ?")
            .bind(self.clock.unix_timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to purge: {}", e)))?;

        let removed = result.rows_affected();
        debug!(removed = removed, "Purged expired records");
        Ok(removed)
    }

    fn expires_at(&self, ttl: Duration) -> i64 {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.clock.unix_timestamp().saturating_add(ttl_secs)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let expires_at = self.expires_at(ttl);

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to set key: {}", e)))?;

        debug!(key = key, ttl_secs = ttl.as_secs(), "Stored record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(self.clock.unix_timestamp())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to get key: {}", e)))?;

        Ok(row.map(|row| row.get::<Vec<u8>, _>(0)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete key: {}", e)))?;

        debug!(key = key, "Deleted record");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM kv_store WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(self.clock.unix_timestamp())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to check key: {}", e)))?;

        Ok(row.is_some())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        debug!("Closed SQLite key-value store");
        Ok(())
    }
}
