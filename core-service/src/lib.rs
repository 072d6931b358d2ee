//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, key-value
//! store, clock) into the HubSpot integration and exposes the operations an
//! HTTP entry layer needs: start an authorization, finish it from the
//! callback, list items and disconnect. Desktop hosts typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and call
//! [`bootstrap`]; other hosts assemble [`CoreDependencies`] themselves.
//!
//! Hosts install the tracing subscriber once with [`init_logging`] before
//! bootstrapping.
//!
//! Errors carry an HTTP status and a `{"error": message}` body via
//! [`CoreError::status_code`] and [`CoreError::to_response_body`].

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::IntegrationItem;
pub use core_auth::{AuthorizationOutcome, CallbackParams};
pub use core_runtime::config::IntegrationConfig;
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, storage::KeyValueStore, time::Clock};
use core_auth::{CredentialStore, OAuthClient, OAuthConfig, OAuthFlowManager};
use core_sync::{SyncConfig, SyncOrchestrator};
use provider_hubspot::{HubSpotConnector, ObjectSource};
use tracing::{info, instrument};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            store,
            clock,
        }
    }
}

/// Primary façade exposed to host applications.
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    auth: Arc<OAuthFlowManager>,
    sync: SyncOrchestrator,
}

impl CoreService {
    /// Create a service talking to HubSpot through `deps.http_client`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `config` does not validate.
    pub fn new(config: &IntegrationConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let source: Arc<dyn ObjectSource> = Arc::new(HubSpotConnector::from_config(
            Arc::clone(&deps.http_client),
            config,
        ));
        Ok(Self::with_source(config, deps, source, SyncConfig::default()))
    }

    /// Create a service with a custom object source and sync settings.
    pub fn with_source(
        config: &IntegrationConfig,
        deps: CoreDependencies,
        source: Arc<dyn ObjectSource>,
        sync_config: SyncConfig,
    ) -> Self {
        let oauth = OAuthClient::new(OAuthConfig::from(config), Arc::clone(&deps.http_client));
        let auth = Arc::new(OAuthFlowManager::new(
            oauth,
            CredentialStore::new(Arc::clone(&deps.store)),
            Arc::clone(&deps.clock),
            config.frontend_success_url.clone(),
        ));
        let sync = SyncOrchestrator::new(Arc::clone(&auth), source, sync_config);

        Self {
            deps: Arc::new(deps),
            auth,
            sync,
        }
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    /// `GET /authorize`: consent page URL for a new flow.
    pub async fn authorize(&self, owner_id: Option<&str>) -> Result<String> {
        Ok(self.auth.begin_authorization(owner_id).await?)
    }

    /// `GET /oauth2callback`: finish the flow and return where to send the
    /// browser.
    pub async fn oauth_callback(&self, params: &CallbackParams) -> Result<AuthorizationOutcome> {
        Ok(self.auth.complete_authorization(params).await?)
    }

    /// `GET /items`: the authenticated owner wins, else the `state` query
    /// parameter of an anonymous flow.
    pub async fn items(
        &self,
        owner_id: Option<&str>,
        state: Option<&str>,
    ) -> Result<Vec<IntegrationItem>> {
        Ok(self.sync.list_items(owner_id, state).await?)
    }

    /// Forget stored credentials. Disconnecting twice is not an error.
    pub async fn disconnect(&self, owner_id: Option<&str>, state: Option<&str>) -> Result<()> {
        Ok(self.auth.disconnect(owner_id, state).await?)
    }

    /// Close the credential store.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        self.auth.store().close().await?;
        info!("Core service shut down");
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Builds a reqwest client with the configured timeout, opens the credential
/// store named by `store_url` (expired SQLite rows are purged on open) and
/// uses the system clock.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap, IntegrationConfig};
///
/// let config = IntegrationConfig::from_env()?;
/// let core = bootstrap(&config).await?;
/// let consent_url = core.authorize(Some("user-1")).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap(config: &IntegrationConfig) -> Result<CoreService> {
    use bridge_desktop::{InMemoryKeyValueStore, ReqwestHttpClient, SqliteKeyValueStore};
    use bridge_traits::time::SystemClock;
    use core_runtime::config::StoreBackend;
    use tracing::warn;

    config.validate()?;

    if !config.has_client_id() {
        warn!("HUBSPOT_CLIENT_ID is not set; authorization requests will fail");
    }

    let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    let store: Arc<dyn KeyValueStore> = match config.store_backend()? {
        StoreBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        StoreBackend::Sqlite(url) => {
            let store = SqliteKeyValueStore::connect(&url)
                .await
                .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
            let purged = store
                .purge_expired()
                .await
                .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
            info!(purged = purged, "Purged expired credential store rows");
            Arc::new(store)
        }
    };

    info!(config = ?config, "Bootstrapped core service");
    CoreService::new(
        config,
        CoreDependencies::new(Arc::new(http_client), store, Arc::new(SystemClock)),
    )
}
