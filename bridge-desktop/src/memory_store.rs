//! In-process TTL key-value store

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    storage::KeyValueStore,
    time::{Clock, SystemClock},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

struct Entry {
    value: Vec<u8>,
    expires_at: i64,
}

/// `HashMap`-backed store for tests and single-process hosts
///
/// Contents are lost when the process exits. Expired entries are hidden from
/// reads immediately and dropped lazily on the next write.
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = self.clock.unix_timestamp();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let now = self.clock.unix_timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: now.saturating_add(ttl_secs),
            },
        );

        debug!(key = key, ttl_secs = ttl_secs, "Stored record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.unix_timestamp();
        let entries = self.entries.read().await;

        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        debug!(key = key, "Deleted record");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::FixedClock;

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let clock = Arc::new(FixedClock::at_unix(0));
        let store = InMemoryKeyValueStore::with_clock(clock.clone());

        store.set("k", b"first", Duration::from_secs(10)).await.unwrap();
        clock.set_unix(8);
        store.set("k", b"second", Duration::from_secs(10)).await.unwrap();

        clock.set_unix(15);
        assert_eq!(store.get("k").await.unwrap(), Some(b"second".to_vec()));

        clock.set_unix(18);
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_close_drops_contents() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.len().await, 1);

        store.close().await.unwrap();
        assert!(store.is_empty().await);
    }
}
