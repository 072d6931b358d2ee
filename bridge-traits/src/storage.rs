//! Key-Value Storage Abstraction
//!
//! Provides a platform-agnostic trait for persistence with per-record expiry.
//! Both OAuth state tokens and stored credentials live behind this contract.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Key-value store with per-record time-to-live
///
/// Abstracts TTL-capable storage backends:
/// - Desktop: SQLite table with an expiry column
/// - Tests/dev: in-process map with clock-driven expiry
/// - Server: any networked TTL cache reachable from the host
///
/// # Contract
///
/// - `set` is a full overwrite and restarts the record's TTL countdown
/// - An expired record is indistinguishable from an absent one
/// - `get` returning `Ok(None)` means absent; `Err` means the backend failed
/// - `delete` is idempotent
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
/// use std::time::Duration;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("state:abc", b"{}", Duration::from_secs(300)).await?;
///     assert!(store.exists("state:abc").await?);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a value, replacing any previous value and resetting its TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Retrieve a value
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a live value exists without returning it
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Release backend resources (connection pools, file handles)
    ///
    /// Called once at host shutdown. The store must not be used afterwards.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
