//! Uniform item type returned to hosts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A provider object flattened into a host-facing record
///
/// Constructed fresh on every fetch and never persisted. `parameters` carries
/// the object-type-specific fields; absent provider properties appear as
/// `null` rather than being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationItem {
    pub id: String,
    pub title: String,
    pub parameters: Map<String, Value>,
}

impl IntegrationItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parameters: Map::new(),
        }
    }

    /// Add a parameter, replacing any existing value under the same name
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}
