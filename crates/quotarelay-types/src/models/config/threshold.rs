//! Threshold guard configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Utilization ceiling above which requests are rejected locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ThresholdConfig {
    /// Enable the pre-flight check
    #[serde(default)]
    pub enabled: bool,
    /// Ceiling in percent (0-100); utilization at or above it is rejected
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default = "default_utilization_percent")]
    pub utilization_percent: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self { enabled: false, utilization_percent: default_utilization_percent() }
    }
}

fn default_utilization_percent() -> f64 {
    95.0
}
