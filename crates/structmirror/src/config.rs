use serde::{Deserialize, Serialize};
use sm_context::ContextConfig;
use sm_observe::ObserverConfig;

use crate::error::{MirrorError, MirrorResult};

/// Combined configuration for a [`Mirror`](crate::Mirror).
///
/// ```toml
/// [context]
/// name = "comments"
/// auto_process_changes = false
///
/// [observer]
/// deliver_inserts = true
/// report_decode_errors = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub context: ContextConfig,
    /// Applied to every observer the mirror creates.
    pub observer: ObserverConfig,
}

impl MirrorConfig {
    pub fn from_toml_str(s: &str) -> MirrorResult<Self> {
        toml::from_str(s).map_err(|e| MirrorError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> MirrorResult<String> {
        toml::to_string(self).map_err(|e| MirrorError::Config(e.to_string()))
    }
}
