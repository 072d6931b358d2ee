//! # Host Bridge Traits
//!
//! Capability contracts that the CRM connect core requires from its host.
//!
//! ## Overview
//!
//! The core never talks to the network, a database or the system clock
//! directly. Each of those capabilities is expressed as a trait here and
//! implemented by a host adapter crate (`bridge-desktop` for native hosts).
//! Tests substitute their own implementations.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with per-request timeout
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Key-value persistence with per-record TTL
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Shared Types
//!
//! - [`IntegrationItem`](integration::IntegrationItem) - Uniform record shown to the host
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters should
//! convert their library-specific errors into it with an actionable message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single adapter instance can be
//! shared across concurrent requests behind an `Arc`.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod integration;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use integration::IntegrationItem;
pub use storage::KeyValueStore;
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
