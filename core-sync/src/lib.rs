//! # Sync Module
//!
//! Turns a stored HubSpot connection into a flat list of integration items.
//!
//! ## Overview
//!
//! [`SyncOrchestrator::list_items`] resolves (and if needed refreshes) the
//! caller's credentials, then fetches contacts, companies and deals in that
//! order. A failure in one object type is isolated: it is logged and replaced
//! by a single error item while the other types are still returned.

pub mod error;
pub mod orchestrator;

pub use error::{Result, SyncError};
pub use orchestrator::{SyncConfig, SyncOrchestrator};
