use serde::{Deserialize, Serialize};

use crate::error::{ContextError, Result};

/// Configuration for a [`Context`](crate::Context).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Human-readable name, used in log output.
    pub name: String,
    /// When `true`, every mutation publishes its own change batch instead of
    /// accumulating until `process_pending_changes` or `save`.
    pub auto_process_changes: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            auto_process_changes: false,
        }
    }
}

impl ContextConfig {
    /// A configuration that notifies observers after every mutation.
    pub fn immediate() -> Self {
        Self {
            auto_process_changes: true,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ContextError::Config(e.to_string()))
    }
}
