//! OAuth Flow Manager
//!
//! Drives one authorization flow from consent redirect to stored credentials,
//! and keeps stored credentials usable afterwards.
//!
//! # Flow
//!
//! - `begin_authorization` stores a state token and moves the flow to
//!   awaiting callback
//! - `complete_authorization` with a live state completes it
//! - An unused state expires after five minutes
//! - A denied consent or a rejected code exchange fails the flow for good
//!
//! A state token is consumed before the token exchange is attempted, so a
//! callback can succeed at most once and a failed exchange cannot be retried
//! with the same state.
//!
//! # Refresh
//!
//! [`OAuthFlowManager::resolve_credentials`] refreshes tokens that expire
//! within [`REFRESH_MARGIN_SECS`] and always rewrites the record, restarting
//! its TTL. Concurrent resolutions of the same identity are not serialized.

use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::oauth::OAuthClient;
use crate::types::{AuthorizationOutcome, CredentialKey, CredentialRecord, StateRecord};
use bridge_traits::time::Clock;
use core_runtime::logging::{redact_if_sensitive, short_id};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// Seconds before expiry at which an access token is already refreshed
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Query parameters delivered to the OAuth callback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Authorization flow and credential lifecycle manager
///
/// # Example
///
/// ```no_run
/// use core_auth::{CallbackParams, CredentialStore, OAuthClient, OAuthFlowManager};
/// use std::sync::Arc;
/// # use bridge_traits::{storage::KeyValueStore, time::SystemClock};
/// # async fn example(oauth: OAuthClient, kv: Arc<dyn KeyValueStore>) -> core_auth::Result<()> {
/// let manager = OAuthFlowManager::new(
///     oauth,
///     CredentialStore::new(kv),
///     Arc::new(SystemClock),
///     "http://localhost:3000/integrations?connected=hubspot",
/// );
///
/// let consent_url = manager.begin_authorization(Some("user-1")).await?;
/// // ...browser consents, provider calls back...
/// # let callback = CallbackParams::default();
/// let outcome = manager.complete_authorization(&callback).await?;
/// println!("redirect to {}", outcome.redirect_url);
/// # Ok(())
/// # }
/// ```
pub struct OAuthFlowManager {
    oauth: OAuthClient,
    store: CredentialStore,
    clock: Arc<dyn Clock>,
    frontend_success_url: String,
}

impl OAuthFlowManager {
    pub fn new(
        oauth: OAuthClient,
        store: CredentialStore,
        clock: Arc<dyn Clock>,
        frontend_success_url: impl Into<String>,
    ) -> Self {
        Self {
            oauth,
            store,
            clock,
            frontend_success_url: frontend_success_url.into(),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Starts an authorization flow.
    ///
    /// Mints an unguessable state token, remembers it (with the optional
    /// owner) for five minutes, and returns the provider consent URL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if no client id is configured.
    /// Nothing is stored in that case.
    #[instrument(skip(self))]
    pub async fn begin_authorization(&self, owner_id: Option<&str>) -> Result<String> {
        let state_token = Uuid::new_v4().to_string();

        // Fails fast on missing client id before anything is persisted
        let consent_url = self.oauth.authorization_url(&state_token).map_err(|e| {
            error!(error = %e, "Cannot start authorization");
            e
        })?;

        let record = StateRecord {
            state_token: state_token.clone(),
            created_at: self.clock.unix_timestamp(),
            owner_id: owner_id.filter(|id| !id.is_empty()).map(str::to_string),
        };
        self.store.put_state(&record).await?;

        info!(
            flow = short_id(&state_token),
            has_owner = record.owner_id.is_some(),
            "Authorization flow started"
        );
        Ok(consent_url)
    }

    /// Handles the provider callback.
    ///
    /// On success the state token is consumed, the code is exchanged, and the
    /// resulting credentials are stored under the flow's owner if it had one,
    /// else under the state token itself.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProviderDenied`] if the callback carries an `error`
    /// - [`AuthError::InvalidRequest`] if `code` or `state` is missing
    /// - [`AuthError::InvalidOrExpiredState`] for unknown, reused or expired state
    /// - [`AuthError::TokenExchange`] if the provider rejects the code
    #[instrument(skip(self, params))]
    pub async fn complete_authorization(
        &self,
        params: &CallbackParams,
    ) -> Result<AuthorizationOutcome> {
        if let Some(provider_error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            warn!(error = provider_error, "Provider returned an OAuth error");
            return Err(AuthError::ProviderDenied(provider_error.to_string()));
        }

        let (code, state) = match (
            params.code.as_deref().filter(|c| !c.is_empty()),
            params.state.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(code), Some(state)) => (code, state),
            _ => return Err(AuthError::InvalidRequest("Missing code or state".to_string())),
        };

        debug!(
            code = %redact_if_sensitive("code", code),
            flow = short_id(state),
            "Callback received"
        );

        let state_record = self.store.get_state(state).await?.ok_or_else(|| {
            warn!(flow = short_id(state), "Invalid or expired state");
            AuthError::InvalidOrExpiredState
        })?;

        // Single use: consumed before any network I/O
        self.store.delete_state(state).await?;

        let tokens = self.oauth.exchange_code(code).await.map_err(|e| {
            error!(flow = short_id(state), error = %e, "Code exchange failed");
            e
        })?;

        let record = CredentialRecord {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: self.clock.unix_timestamp().saturating_add(tokens.expires_in),
            raw: tokens.raw,
        };

        let credential_key = state_record.credential_key();
        self.store.put_credentials(&credential_key, &record).await?;

        info!(key = %credential_key, expires_at = record.expires_at, "Stored credentials");

        Ok(AuthorizationOutcome {
            redirect_url: self.success_redirect(state)?,
            flow_id: state.to_string(),
            credential_key,
        })
    }

    /// Loads credentials for an owner or flow, refreshing them if needed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::IdentifierRequired`] if neither id is given
    /// - [`AuthError::NotFound`] if nothing is stored
    /// - Any error from [`refresh_if_needed`](Self::refresh_if_needed)
    pub async fn resolve_credentials(
        &self,
        owner_id: Option<&str>,
        flow_id: Option<&str>,
    ) -> Result<CredentialRecord> {
        let key = CredentialKey::resolve(owner_id, flow_id)?;
        self.resolve_credentials_for(&key).await
    }

    /// [`resolve_credentials`](Self::resolve_credentials) for an already
    /// resolved key.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn resolve_credentials_for(&self, key: &CredentialKey) -> Result<CredentialRecord> {
        let stored = self.store.get_credentials(key).await?.ok_or_else(|| {
            warn!("No credentials found");
            AuthError::NotFound(key.to_string())
        })?;

        let record = self.refresh_if_needed(stored).await?;

        // Rewritten even when unchanged so the TTL tracks last access
        self.store.put_credentials(key, &record).await?;

        Ok(record)
    }

    /// Refreshes `record` if its access token expires within
    /// [`REFRESH_MARGIN_SECS`]; otherwise returns it untouched without any
    /// network call.
    ///
    /// An existing refresh token is kept when the provider doesn't rotate it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoRefreshToken`] if a refresh is due but impossible
    /// - [`AuthError::TokenRefresh`] if the provider rejects the refresh
    pub async fn refresh_if_needed(&self, record: CredentialRecord) -> Result<CredentialRecord> {
        let now = self.clock.unix_timestamp();

        if !record.needs_refresh(now, REFRESH_MARGIN_SECS) {
            debug!(expires_at = record.expires_at, "Token is valid, no refresh needed");
            return Ok(record);
        }

        info!(expires_at = record.expires_at, "Token expired or expiring soon, refreshing");

        let refresh_token = record.refresh_token.clone().ok_or_else(|| {
            error!("No refresh token available");
            AuthError::NoRefreshToken
        })?;

        let tokens = self.oauth.refresh(&refresh_token).await?;

        let refreshed = CredentialRecord {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.or(Some(refresh_token)),
            expires_at: self.clock.unix_timestamp().saturating_add(tokens.expires_in),
            raw: record.raw,
        };

        info!(expires_at = refreshed.expires_at, "Token refreshed successfully");
        Ok(refreshed)
    }

    /// Forget stored credentials. Deleting absent credentials is not an error.
    #[instrument(skip(self, flow_id))]
    pub async fn disconnect(&self, owner_id: Option<&str>, flow_id: Option<&str>) -> Result<()> {
        let key = CredentialKey::resolve(owner_id, flow_id)?;
        self.store.delete_credentials(&key).await?;
        info!(key = %key, "Credentials removed");
        Ok(())
    }

    fn success_redirect(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.frontend_success_url).map_err(|e| {
            AuthError::Configuration(format!("Invalid frontend success URL: {}", e))
        })?;
        url.query_pairs_mut().append_pair("state", state);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::OAuthConfig;
    use async_trait::async_trait;
    use bridge_desktop::InMemoryKeyValueStore;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::time::FixedClock;
    use mockall::mock;
    use serde_json::Map;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    const NOW: i64 = 1_700_000_000;

    fn manager(http: MockHttpClient) -> (OAuthFlowManager, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_unix(NOW));
        let kv = Arc::new(InMemoryKeyValueStore::with_clock(clock.clone()));
        let manager = OAuthFlowManager::new(
            OAuthClient::new(OAuthConfig::hubspot("cid", "secret"), Arc::new(http)),
            CredentialStore::new(kv),
            clock.clone(),
            "http://localhost:3000/integrations?connected=hubspot",
        );
        (manager, clock)
    }

    fn record(expires_at: i64, refresh_token: Option<&str>) -> CredentialRecord {
        CredentialRecord {
            access_token: "old-access".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at,
            raw: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_valid_token_is_not_refreshed() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();
        let (manager, _) = manager(http);

        let fresh = record(NOW + REFRESH_MARGIN_SECS + 1, Some("rt"));
        let result = manager.refresh_if_needed(fresh.clone()).await.unwrap();
        assert_eq!(result, fresh);
    }

    #[tokio::test]
    async fn test_token_at_exact_margin_is_refreshed() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"new","expires_in":1800}"#)));
        let (manager, _) = manager(http);

        let result = manager
            .refresh_if_needed(record(NOW + REFRESH_MARGIN_SECS, Some("rt")))
            .await
            .unwrap();
        assert_eq!(result.access_token, "new");
        assert_eq!(result.expires_at, NOW + 1800);
    }

    #[tokio::test]
    async fn test_huge_expires_in_saturates() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                200,
                format!(r#"{{"access_token":"new","expires_in":{}}}"#, i64::MAX),
            ))
        });
        let (manager, _) = manager(http);

        let result = manager
            .refresh_if_needed(record(NOW - 5, Some("rt")))
            .await
            .unwrap();
        assert_eq!(result.expires_at, i64::MAX);
        assert!(!result.needs_refresh(NOW, REFRESH_MARGIN_SECS));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"new","expires_in":1800}"#)));
        let (manager, _) = manager(http);

        let stale = record(NOW + 59, Some("keep-me"));
        let result = manager.refresh_if_needed(stale).await.unwrap();

        assert_eq!(result.access_token, "new");
        assert_eq!(result.refresh_token.as_deref(), Some("keep-me"));
        assert_eq!(result.expires_at, NOW + 1800);
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();
        let (manager, _) = manager(http);

        let result = manager.refresh_if_needed(record(NOW - 5, None)).await;
        assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    }

    #[tokio::test]
    async fn test_provider_error_wins_over_everything() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();
        let (manager, _) = manager(http);

        let params = CallbackParams {
            code: Some("c".to_string()),
            state: Some("s".to_string()),
            error: Some("access_denied".to_string()),
        };
        let result = manager.complete_authorization(&params).await;
        assert!(matches!(result, Err(AuthError::ProviderDenied(e)) if e == "access_denied"));
    }

    #[tokio::test]
    async fn test_missing_code_or_state() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();
        let (manager, _) = manager(http);

        let params = CallbackParams {
            code: Some("c".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            manager.complete_authorization(&params).await,
            Err(AuthError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();
        let (manager, clock) = manager(http);

        let consent = manager.begin_authorization(None).await.unwrap();
        let state = Url::parse(&consent)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        clock.set_unix(NOW + 301);

        let params = CallbackParams {
            code: Some("c".to_string()),
            state: Some(state),
            error: None,
        };
        assert!(matches!(
            manager.complete_authorization(&params).await,
            Err(AuthError::InvalidOrExpiredState)
        ));
    }

    #[test]
    fn test_success_redirect_separator() {
        let (manager, _) = manager(MockHttpClient::new());
        assert_eq!(
            manager.success_redirect("abc").unwrap(),
            "http://localhost:3000/integrations?connected=hubspot&state=abc"
        );

        let plain = OAuthFlowManager {
            frontend_success_url: "http://localhost:3000/done".to_string(),
            ..manager
        };
        assert_eq!(
            plain.success_redirect("abc").unwrap(),
            "http://localhost:3000/done?state=abc"
        );
    }
}
