//! Backoff ledger configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tiered lockout defaults, used only when an error carries no explicit duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct BackoffConfig {
    /// QUOTA_EXHAUSTED tiers, indexed by consecutive failure count
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_quota_steps")]
    pub quota_exhausted_steps_secs: Vec<u64>,
    /// MODEL_CAPACITY_EXHAUSTED tiers, indexed by consecutive failure count
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_capacity_steps")]
    pub model_capacity_steps_secs: Vec<u64>,
    /// Constant lockout for RATE_LIMIT_EXCEEDED
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_default_secs: u64,
    /// Constant lockout for upstream 5xx
    #[serde(default = "default_server_error_secs")]
    pub server_error_default_secs: u64,
    /// Constant lockout when the reason is unknown
    #[serde(default = "default_unknown_secs")]
    pub unknown_default_secs: u64,
    /// Safety floor applied to every computed wait
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_min_retry_secs")]
    pub min_retry_secs: u64,
    /// Failure counters older than this are treated as zero
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_failure_decay_secs")]
    pub failure_decay_secs: u64,
    /// Interval of the expired-lockout sweep (0 disables it)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            quota_exhausted_steps_secs: default_quota_steps(),
            model_capacity_steps_secs: default_capacity_steps(),
            rate_limit_default_secs: default_rate_limit_secs(),
            server_error_default_secs: default_server_error_secs(),
            unknown_default_secs: default_unknown_secs(),
            min_retry_secs: default_min_retry_secs(),
            failure_decay_secs: default_failure_decay_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_quota_steps() -> Vec<u64> {
    vec![60, 300, 1800, 7200]
}

fn default_capacity_steps() -> Vec<u64> {
    vec![5, 10, 15]
}

fn default_rate_limit_secs() -> u64 {
    5
}

fn default_server_error_secs() -> u64 {
    8
}

fn default_unknown_secs() -> u64 {
    60
}

fn default_min_retry_secs() -> u64 {
    2
}

fn default_failure_decay_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    300
}
