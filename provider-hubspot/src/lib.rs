//! # HubSpot Provider
//!
//! Reads CRM objects from the HubSpot v3 API.
//!
//! ## Overview
//!
//! This module provides:
//! - Cursor pagination over `/crm/v3/objects/*` (`limit` + `after`)
//! - Wire types for list responses
//! - Normalization of contacts, companies and deals into
//!   [`IntegrationItem`](bridge_traits::IntegrationItem)s
//! - The [`ObjectSource`] seam the sync orchestrator depends on

pub mod connector;
pub mod error;
pub mod items;
pub mod types;

pub use connector::{HubSpotConnector, ObjectSource};
pub use error::{HubSpotError, Result};
pub use items::{error_item, normalize, ObjectType};
pub use types::{HubSpotObject, ListObjectsResponse, NextPage, Paging};
