//! Credential Storage
//!
//! Persists OAuth state tokens and credential records in a TTL-capable
//! [`KeyValueStore`].
//!
//! ## Key Layout
//!
//! - `state:<token>` holds a [`StateRecord`] for [`STATE_TTL`]
//! - `owner:<owner_id>:creds` or `flow:<flow_id>:creds` holds a
//!   [`CredentialRecord`] for [`CREDENTIAL_TTL`]
//!
//! Every write is a full overwrite and restarts the record's TTL.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{CredentialKey, CredentialStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::KeyValueStore;
//! # async fn example(kv: Arc<dyn KeyValueStore>) -> core_auth::Result<()> {
//! let store = CredentialStore::new(kv);
//!
//! let key = CredentialKey::Owner("user-1".to_string());
//! match store.get_credentials(&key).await? {
//!     Some(record) => println!("expires at {}", record.expires_at),
//!     None => println!("not connected"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{CredentialKey, CredentialRecord, StateRecord};
use bridge_traits::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Lifetime of a pending authorization
pub const STATE_TTL: Duration = Duration::from_secs(300);

/// Lifetime of stored credentials since their last write
pub const CREDENTIAL_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Typed JSON records on top of a [`KeyValueStore`]
///
/// Absence is reported as `Ok(None)`. A record that exists but cannot be
/// decoded is deleted and reported as [`AuthError::CorruptRecord`], so callers
/// can tell "not found" from "found but malformed".
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Serialize and write `record`, replacing anything under `key`
    pub async fn put<T: Serialize>(&self, key: &str, record: &T, ttl: Duration) -> Result<()> {
        let json = serde_json::to_vec(record).map_err(|e| {
            warn!(key = key, error = %e, "Failed to serialize record");
            AuthError::Serialization {
                context: format!("writing {}", key),
                source: e,
            }
        })?;

        self.store.set(key, &json, ttl).await.map_err(|e| {
            warn!(key = key, error = %e, "Failed to write record");
            AuthError::Store(e.to_string())
        })?;

        debug!(key = key, ttl_secs = ttl.as_secs(), "Record stored");
        Ok(())
    }

    /// Read and decode the record under `key`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let data = self.store.get(key).await.map_err(|e| {
            warn!(key = key, error = %e, "Failed to read record");
            AuthError::Store(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(key = key, "No record found");
            return Ok(None);
        };

        match serde_json::from_slice(&data) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(key = key, error = %e, "Stored record is corrupted, deleting it");

                if let Err(delete_err) = self.store.delete(key).await {
                    warn!(key = key, error = %delete_err, "Failed to delete corrupted record");
                }

                Err(AuthError::CorruptRecord {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key).await.map_err(|e| {
            warn!(key = key, error = %e, "Failed to delete record");
            AuthError::Store(e.to_string())
        })?;

        debug!(key = key, "Record deleted");
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.store
            .exists(key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    pub async fn put_state(&self, record: &StateRecord) -> Result<()> {
        self.put(&StateRecord::storage_key(&record.state_token), record, STATE_TTL)
            .await
    }

    pub async fn get_state(&self, state_token: &str) -> Result<Option<StateRecord>> {
        self.get(&StateRecord::storage_key(state_token)).await
    }

    pub async fn delete_state(&self, state_token: &str) -> Result<()> {
        self.delete(&StateRecord::storage_key(state_token)).await
    }

    pub async fn put_credentials(
        &self,
        key: &CredentialKey,
        record: &CredentialRecord,
    ) -> Result<()> {
        self.put(&key.storage_key(), record, CREDENTIAL_TTL).await
    }

    pub async fn get_credentials(&self, key: &CredentialKey) -> Result<Option<CredentialRecord>> {
        self.get(&key.storage_key()).await
    }

    pub async fn delete_credentials(&self, key: &CredentialKey) -> Result<()> {
        self.delete(&key.storage_key()).await
    }

    pub async fn has_credentials(&self, key: &CredentialKey) -> Result<bool> {
        self.exists(&key.storage_key()).await
    }

    /// Release the underlying store
    pub async fn close(&self) -> Result<()> {
        self.store
            .close()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}
