use crate::error::{Result, SyncError};
use bridge_traits::IntegrationItem;
use core_auth::{CredentialKey, OAuthFlowManager};
use futures::future::join_all;
use provider_hubspot::{error_item, ObjectSource, ObjectType};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Sync behaviour knobs
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fetch the object types concurrently. Output order is the same either
    /// way.
    pub concurrent_fetch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrent_fetch: true,
        }
    }
}

/// Lists every synchronized CRM object for one identity
pub struct SyncOrchestrator {
    auth: Arc<OAuthFlowManager>,
    source: Arc<dyn ObjectSource>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        auth: Arc<OAuthFlowManager>,
        source: Arc<dyn ObjectSource>,
        config: SyncConfig,
    ) -> Self {
        Self {
            auth,
            source,
            config,
        }
    }

    /// List items for an owner, falling back to a flow id
    ///
    /// # Errors
    ///
    /// Only failures before any object type is fetched are returned:
    /// credential resolution errors as [`SyncError::Auth`] and an empty access
    /// token as [`SyncError::NoAccessToken`]. Per-type fetch failures become
    /// error items in the result.
    pub async fn list_items(
        &self,
        owner_id: Option<&str>,
        flow_id: Option<&str>,
    ) -> Result<Vec<IntegrationItem>> {
        let key = CredentialKey::resolve(owner_id, flow_id)?;
        self.list_items_for(&key).await
    }

    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn list_items_for(&self, key: &CredentialKey) -> Result<Vec<IntegrationItem>> {
        let record = self.auth.resolve_credentials_for(key).await?;

        if !record.has_access_token() {
            warn!(key = %key, "Stored credentials have no access token");
            return Err(SyncError::NoAccessToken);
        }

        let token = record.access_token.as_str();
        let batches = if self.config.concurrent_fetch {
            join_all(
                ObjectType::ALL
                    .iter()
                    .map(|&object_type| self.fetch_type(key, object_type, token)),
            )
            .await
        } else {
            let mut batches = Vec::with_capacity(ObjectType::ALL.len());
            for object_type in ObjectType::ALL {
                batches.push(self.fetch_type(key, object_type, token).await);
            }
            batches
        };

        let items: Vec<IntegrationItem> = batches.into_iter().flatten().collect();
        info!(key = %key, count = items.len(), "Listed integration items");
        Ok(items)
    }

    async fn fetch_type(
        &self,
        key: &CredentialKey,
        object_type: ObjectType,
        access_token: &str,
    ) -> Vec<IntegrationItem> {
        match self.source.list_objects(object_type, access_token).await {
            Ok(items) => {
                debug!(key = %key, object_type = %object_type, count = items.len(), "Fetched objects");
                items
            }
            Err(e) => {
                error!(
                    key = %key,
                    object_type = %object_type,
                    status = ?e.status_code(),
                    error = %e,
                    "Error fetching objects"
                );
                vec![error_item(object_type, e.to_string())]
            }
        }
    }
}
