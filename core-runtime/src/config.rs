//! # Integration Configuration
//!
//! Startup configuration for the HubSpot integration.
//!
//! ## Overview
//!
//! [`IntegrationConfig`] is built once, either from the process environment
//! ([`IntegrationConfig::from_env`]) or through [`IntegrationConfigBuilder`],
//! and validated before anything else is constructed. After that it is an
//! immutable input to the auth, sync and service layers.
//!
//! ## Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `HUBSPOT_CLIENT_ID` | unset |
//! | `HUBSPOT_CLIENT_SECRET` | unset |
//! | `HUBSPOT_REDIRECT_URI` | `http://localhost:8000/api/integrations/oauth2callback/hubspot` |
//! | `FRONTEND_SUCCESS_URL` | `http://localhost:3000/integrations?connected=hubspot` |
//! | `CREDENTIAL_STORE_URL` | `memory://` |
//! | `HUBSPOT_HTTP_TIMEOUT_SECS` | `20` |
//!
//! A missing client id is not a startup failure. It is reported when an
//! authorization is first attempted.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::IntegrationConfig;
//!
//! let config = IntegrationConfig::builder()
//!     .client_id("my-app")
//!     .client_secret("shh")
//!     .store_url("sqlite://data/credentials.db")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://app.hubspot.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.hubapi.com/oauth/v1/token";
pub const DEFAULT_API_BASE: &str = "https://api.hubapi.com";
pub const DEFAULT_SCOPE: &str =
    "contacts crm.objects.contacts crm.objects.companies crm.objects.deals oauth";
pub const DEFAULT_REDIRECT_URI: &str =
    "http://localhost:8000/api/integrations/oauth2callback/hubspot";
pub const DEFAULT_FRONTEND_SUCCESS_URL: &str =
    "http://localhost:3000/integrations?connected=hubspot";
pub const DEFAULT_STORE_URL: &str = "memory://";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 20;

/// Where credentials and state tokens are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map, lost on restart
    Memory,
    /// SQLite database; holds the full `sqlite:` connection string
    Sqlite(String),
}

impl StoreBackend {
    /// Parse a store connection string
    ///
    /// Accepts `memory://`, `sqlite::memory:` and `sqlite://<path>`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "memory://" || url == "memory:" {
            Ok(StoreBackend::Memory)
        } else if url.starts_with("sqlite:") {
            Ok(StoreBackend::Sqlite(url.to_string()))
        } else {
            Err(Error::InvalidSetting {
                name: "CREDENTIAL_STORE_URL".to_string(),
                message: format!(
                    "unsupported store '{}'; expected memory:// or sqlite://<path>",
                    url
                ),
            })
        }
    }
}

/// Immutable startup configuration
#[derive(Clone)]
pub struct IntegrationConfig {
    /// OAuth client id registered with HubSpot
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Callback URI registered with HubSpot
    pub redirect_uri: String,
    /// Where the browser lands after a successful connection
    pub frontend_success_url: String,
    /// Credential store connection string
    pub store_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base: String,
    /// Space separated scope string sent on authorize
    pub scope: String,
    /// Whole-request timeout for every outbound call
    pub http_timeout: Duration,
    /// Objects requested per page
    pub page_size: u32,
    /// Hard cap on pages fetched per object type
    pub max_pages: u32,
}

impl std::fmt::Debug for IntegrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("frontend_success_url", &self.frontend_success_url)
            .field("store_url", &self.store_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .field("scope", &self.scope)
            .field("http_timeout", &self.http_timeout)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            frontend_success_url: DEFAULT_FRONTEND_SUCCESS_URL.to_string(),
            store_url: DEFAULT_STORE_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl IntegrationConfig {
    /// Creates a new builder seeded with defaults
    pub fn builder() -> IntegrationConfigBuilder {
        IntegrationConfigBuilder::default()
    }

    /// Read configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed, or the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();

        if let Some(client_id) = get("HUBSPOT_CLIENT_ID") {
            builder = builder.client_id(client_id);
        }
        if let Some(secret) = get("HUBSPOT_CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(uri) = get("HUBSPOT_REDIRECT_URI") {
            builder = builder.redirect_uri(uri);
        }
        if let Some(url) = get("FRONTEND_SUCCESS_URL") {
            builder = builder.frontend_success_url(url);
        }
        if let Some(url) = get("CREDENTIAL_STORE_URL") {
            builder = builder.store_url(url);
        }
        if let Some(raw) = get("HUBSPOT_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| Error::InvalidSetting {
                name: "HUBSPOT_HTTP_TIMEOUT_SECS".to_string(),
                message: format!("'{}' is not a whole number of seconds: {}", raw, e),
            })?;
            builder = builder.http_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any endpoint is not an absolute URL, the store URL
    /// is unsupported, the timeout is zero, or paging limits are zero.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("redirect_uri", &self.redirect_uri),
            ("frontend_success_url", &self.frontend_success_url),
            ("authorize_url", &self.authorize_url),
            ("token_url", &self.token_url),
            ("api_base", &self.api_base),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", name)));
            }
            Url::parse(value).map_err(|e| Error::InvalidSetting {
                name: name.to_string(),
                message: format!("'{}' is not a valid URL: {}", value, e),
            })?;
        }

        if self.scope.trim().is_empty() {
            return Err(Error::Config("scope cannot be empty".to_string()));
        }

        StoreBackend::parse(&self.store_url)?;

        if self.http_timeout.is_zero() {
            return Err(Error::Config(
                "http_timeout must be greater than zero".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }

        if self.max_pages == 0 {
            return Err(Error::Config("max_pages must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Parsed credential store backend
    pub fn store_backend(&self) -> Result<StoreBackend> {
        StoreBackend::parse(&self.store_url)
    }

    /// `true` once a non-empty client id has been supplied
    pub fn has_client_id(&self) -> bool {
        self.client_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Builder for [`IntegrationConfig`]
#[derive(Default)]
pub struct IntegrationConfigBuilder {
    config: IntegrationConfig,
}

impl IntegrationConfigBuilder {
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.client_secret = Some(secret.into());
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.redirect_uri = uri.into();
        self
    }

    pub fn frontend_success_url(mut self, url: impl Into<String>) -> Self {
        self.config.frontend_success_url = url.into();
        self
    }

    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store_url = url.into();
        self
    }

    /// Override the provider consent page (tests point this at a fake)
    pub fn authorize_url(mut self, url: impl Into<String>) -> Self {
        self.config.authorize_url = url.into();
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.config.token_url = url.into();
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.config.scope = scope.into();
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Builds and validates the configuration
    ///
    /// # Errors
    ///
    /// See [`IntegrationConfig::validate`].
    pub fn build(self) -> Result<IntegrationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
