//! OAuth 2.0 Protocol Client
//!
//! Speaks the provider side of RFC 6749's authorization code grant:
//! - Building the consent URL
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//!
//! # Security
//!
//! - The client secret travels only in the form body of token requests
//! - Never logs sensitive values (tokens, codes, secrets)
//! - One attempt per call; a failed exchange or refresh is reported as-is
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthClient, OAuthConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig::hubspot("client-id", "client-secret");
//! let client = OAuthClient::new(config, http_client);
//!
//! let consent_url = client.authorization_url("state-token")?;
//! // Redirect the browser to consent_url...
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::{
    IntegrationConfig, DEFAULT_AUTHORIZE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REDIRECT_URI,
    DEFAULT_SCOPE, DEFAULT_TOKEN_URL,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// OAuth 2.0 provider configuration.
#[derive(Clone)]
pub struct OAuthConfig {
    /// OAuth client ID; authorization fails until one is set
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    /// Space separated scope string
    pub scope: String,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Timeout for each token request
    pub timeout: Duration,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OAuthConfig {
    /// HubSpot endpoints and scope with the given app credentials
    pub fn hubspot(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl From<&IntegrationConfig> for OAuthConfig {
    fn from(config: &IntegrationConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            auth_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            timeout: config.http_timeout,
        }
    }
}

/// Token endpoint response.
///
/// Unknown fields are kept in `raw`. A missing `expires_in` counts as zero,
/// which makes the resulting credentials immediately due for refresh.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: Option<String>,
    pub raw: Map<String, Value>,
}

#[derive(Deserialize)]
struct TokenFields {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn parse(response: &HttpResponse) -> Result<Self> {
        let raw: Map<String, Value> =
            serde_json::from_slice(&response.body).map_err(|e| AuthError::Serialization {
                context: "token response".to_string(),
                source: e,
            })?;

        let fields: TokenFields = serde_json::from_value(Value::Object(raw.clone())).map_err(
            |e| AuthError::Serialization {
                context: "token response fields".to_string(),
                source: e,
            },
        )?;

        Ok(Self {
            access_token: fields.access_token,
            refresh_token: fields.refresh_token.filter(|t| !t.is_empty()),
            expires_in: fields.expires_in,
            token_type: fields.token_type,
            raw,
        })
    }
}

/// OAuth 2.0 authorization code client.
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - OAuth provider configuration
    /// * `http_client` - HTTP client for making token requests
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn client_id(&self) -> Result<&str> {
        self.config
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::Configuration("HUBSPOT_CLIENT_ID not configured".to_string()))
    }

    /// Build the consent URL the browser is redirected to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if no client id is configured or
    /// the authorization endpoint is not a valid URL.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let client_id = self.client_id()?;

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No client id is configured
    /// - The request fails or times out ([`AuthError::Network`])
    /// - The token endpoint answers non-2xx ([`AuthError::TokenExchange`],
    ///   carrying the provider's body)
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let client_id = self.client_id()?;

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        debug!("Exchanging authorization code for tokens");

        let response = self.post_token_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let body = response.text_lossy();
            warn!(
                status = status,
                error = %body,
                "Token exchange failed while exchanging authorization code"
            );
            return Err(AuthError::TokenExchange { status, body });
        }

        let tokens = TokenResponse::parse(&response)?;
        info!(
            expires_in = tokens.expires_in,
            has_refresh_token = tokens.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );
        Ok(tokens)
    }

    /// Refresh an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenRefresh`] with the provider's body on a
    /// non-2xx answer, [`AuthError::Network`] on transport failure.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let client_id = self.client_id()?;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        debug!("Refreshing access token");

        let response = self.post_token_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let body = response.text_lossy();
            warn!(status = status, error = %body, "Token refresh failed");
            return Err(AuthError::TokenRefresh { status, body });
        }

        let tokens = TokenResponse::parse(&response)?;
        info!(expires_in = tokens.expires_in, "Refreshed access token");
        Ok(tokens)
    }

    async fn post_token_form(&self, params: &[(&str, &str)]) -> Result<HttpResponse> {
        let encoded = serde_urlencoded::to_string(params).map_err(|e| {
            AuthError::InvalidRequest(format!("Failed to encode token request: {}", e))
        })?;

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .header("Accept", "application/json")
            .form_body(encoded)
            .timeout(self.config.timeout);

        self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Token endpoint unreachable");
            AuthError::Network(e)
        })
    }
}
