//! Hub configuration

use serde::{Deserialize, Serialize};

/// Configuration for a [`Hub`](crate::Hub).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Name attached to the hub's log records.
    pub label: String,

    /// Also store propagated writes on the entity record, so a store bound
    /// later starts from the latest value.
    pub write_through: bool,
}

impl HubConfig {
    /// Create a configuration with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Enable or disable write-through.
    pub fn write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.label.trim().is_empty() {
            return Err("label must not be empty");
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            label: "hub".to_owned(),
            write_through: false,
        }
    }
}
