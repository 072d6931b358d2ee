//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the CRM connect core:
//! - Logging and tracing infrastructure
//! - Startup configuration for the HubSpot integration
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! Configuration is read once at process start and then treated as
//! immutable; logging establishes the `tracing` conventions used by every
//! other crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{IntegrationConfig, IntegrationConfigBuilder, StoreBackend};
pub use error::{Error, Result};
