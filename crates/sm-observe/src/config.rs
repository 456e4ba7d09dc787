use serde::{Deserialize, Serialize};
use sm_context::ChangeKind;

use crate::error::{ObserveError, Result};

/// Configuration for [`RecordObserver`](crate::RecordObserver) and
/// [`EntityObserver`](crate::EntityObserver).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Whether a matching record in the inserted set fires `on_inserted`.
    pub deliver_inserts: bool,
    /// Whether decode failures during dispatch reach `on_decode_error`.
    /// When `false` they are only logged.
    pub report_decode_errors: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            deliver_inserts: true,
            report_decode_errors: true,
        }
    }
}

impl ObserverConfig {
    /// Only updates and deletions are delivered.
    pub fn updates_only() -> Self {
        Self {
            deliver_inserts: false,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ObserveError::Config(e.to_string()))
    }

    /// The batch sets to inspect, in order.
    pub fn inspection_order(&self) -> Vec<ChangeKind> {
        let mut kinds = vec![ChangeKind::Updated, ChangeKind::Deleted];
        if self.deliver_inserts {
            kinds.push(ChangeKind::Inserted);
        }
        kinds
    }
}
