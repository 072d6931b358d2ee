//! HubSpot CRM API connector
//!
//! Walks the v3 object list endpoints page by page and hands the results to
//! the normalizer.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::IntegrationItem;
use core_runtime::config::{
    IntegrationConfig, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{HubSpotError, Result};
use crate::items::{normalize, ObjectType};
use crate::types::{HubSpotObject, ListObjectsResponse};

/// Source of normalized CRM items for one object type
///
/// The sync orchestrator depends on this seam rather than on
/// [`HubSpotConnector`] so fetch failures can be simulated in tests.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Fetch every page of `object_type` and normalize the results,
    /// preserving response order
    async fn list_objects(
        &self,
        object_type: ObjectType,
        access_token: &str,
    ) -> Result<Vec<IntegrationItem>>;
}

/// HubSpot CRM v3 connector
///
/// # Example
///
/// ```ignore
/// use provider_hubspot::{HubSpotConnector, ObjectSource, ObjectType};
///
/// let connector = HubSpotConnector::new(http_client, "https://api.hubapi.com");
/// let contacts = connector.list_objects(ObjectType::Contacts, &access_token).await?;
/// ```
pub struct HubSpotConnector {
    http_client: Arc<dyn HttpClient>,
    api_base: String,
    timeout: Duration,
    page_size: u32,
    max_pages: u32,
}

impl HubSpotConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Connector using the configured API base, timeout and paging limits
    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &IntegrationConfig) -> Self {
        Self::new(http_client, config.api_base.clone())
            .with_timeout(config.http_timeout)
            .with_paging(config.page_size, config.max_pages)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_paging(mut self, page_size: u32, max_pages: u32) -> Self {
        self.page_size = page_size;
        self.max_pages = max_pages;
        self
    }

    /// Fetch all objects behind a list endpoint
    ///
    /// Requests `limit=page_size`, then follows `paging.next.after` until a
    /// page carries no cursor or `max_pages` requests were made. Objects are
    /// returned in response order. Nothing is retried, and a `max_pages` of
    /// zero makes no request at all.
    ///
    /// # Errors
    ///
    /// - [`HubSpotError::Unauthorized`] on a 401
    /// - [`HubSpotError::ApiError`] on any other non-2xx status
    /// - [`HubSpotError::ParseError`] if a page is not valid JSON
    /// - [`HubSpotError::Network`] if the request could not be completed
    #[instrument(skip(self, access_token, properties))]
    pub async fn fetch_all(
        &self,
        path: &str,
        access_token: &str,
        properties: Option<&str>,
        page_size: u32,
        max_pages: u32,
    ) -> Result<Vec<HubSpotObject>> {
        if max_pages == 0 {
            debug!(path = path, "Page limit is zero, nothing fetched");
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let url = self.page_url(path, properties, page_size, after.as_deref());
            let page = self.get_page(path, &url, access_token).await?;
            pages += 1;

            debug!(
                path = path,
                page = pages,
                count = page.results.len(),
                "Fetched page"
            );

            let next = page.next_cursor().map(str::to_string);
            results.extend(page.results);

            match next {
                Some(cursor) if pages < max_pages => after = Some(cursor),
                Some(_) => {
                    warn!(path = path, pages = pages, "Stopped at page limit with more data available");
                    break;
                }
                None => break,
            }
        }

        info!(path = path, pages = pages, count = results.len(), "Listed objects");
        Ok(results)
    }

    fn page_url(
        &self,
        path: &str,
        properties: Option<&str>,
        page_size: u32,
        after: Option<&str>,
    ) -> String {
        let mut url = format!("{}{}?limit={}", self.api_base, path, page_size);

        if let Some(properties) = properties.filter(|p| !p.is_empty()) {
            url.push_str(&format!("&properties={}", urlencoding::encode(properties)));
        }

        if let Some(after) = after {
            url.push_str(&format!("&after={}", urlencoding::encode(after)));
        }

        url
    }

    async fn get_page(
        &self,
        path: &str,
        url: &str,
        access_token: &str,
    ) -> Result<ListObjectsResponse> {
        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(access_token)
            .header("Content-Type", "application/json")
            .timeout(self.timeout);

        let response = self.http_client.execute(request).await?;

        if response.status == 401 {
            warn!(path = path, status = 401, "HubSpot rejected the access token");
            return Err(HubSpotError::Unauthorized(path.to_string()));
        }

        if !response.is_success() {
            let message = response.text_lossy();
            error!(path = path, status = response.status, body = %message, "HubSpot API error");
            return Err(HubSpotError::ApiError {
                status_code: response.status,
                message,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            HubSpotError::ParseError(format!("Failed to parse {} page: {}", path, e))
        })
    }
}

#[async_trait]
impl ObjectSource for HubSpotConnector {
    #[instrument(skip(self, access_token), fields(object_type = %object_type))]
    async fn list_objects(
        &self,
        object_type: ObjectType,
        access_token: &str,
    ) -> Result<Vec<IntegrationItem>> {
        let objects = self
            .fetch_all(
                object_type.path(),
                access_token,
                Some(object_type.properties()),
                self.page_size,
                self.max_pages,
            )
            .await?;

        Ok(objects
            .iter()
            .map(|object| normalize(object_type, object))
            .collect())
    }
}
