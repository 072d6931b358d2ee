//! # Authentication Module
//!
//! OAuth 2.0 connection flow and credential lifecycle for the HubSpot
//! integration.
//!
//! ## Overview
//!
//! This module turns a browser consent round trip into stored credentials and
//! keeps those credentials usable: state tokens guard the callback against
//! CSRF and replay, token pairs are persisted per identity, and access tokens
//! are refreshed shortly before they expire.
//!
//! ## Features
//!
//! - Authorization code flow with single-use, five-minute state tokens
//! - Credentials keyed by authenticated owner or, failing that, by flow id
//! - Refresh 60 seconds ahead of expiry, keeping unrotated refresh tokens
//! - TTL-backed storage through the host's `KeyValueStore`

pub mod credential_store;
pub mod error;
pub mod manager;
pub mod oauth;
pub mod types;

pub use credential_store::{CredentialStore, CREDENTIAL_TTL, STATE_TTL};
pub use error::{AuthError, Result};
pub use manager::{CallbackParams, OAuthFlowManager, REFRESH_MARGIN_SECS};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};
pub use types::{AuthorizationOutcome, CredentialKey, CredentialRecord, StateRecord};
