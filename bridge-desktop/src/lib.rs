//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for native hosts
//! (macOS, Windows, Linux, server processes).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest` (20s timeout, single attempt)
//! - `KeyValueStore` using an SQLite table with an expiry column
//! - `KeyValueStore` using an in-process map for tests and dev hosts
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteKeyValueStore};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let store = SqliteKeyValueStore::open(Path::new("data/credentials.db")).await?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod kv_store;
mod memory_store;

pub use http::{ReqwestHttpClient, DEFAULT_TIMEOUT};
pub use kv_store::SqliteKeyValueStore;
pub use memory_store::InMemoryKeyValueStore;
