//! Resilience configuration types.
//!
//! Every field carries a serde default so a partial JSON file only needs to
//! mention the values it overrides.

mod backoff;
mod fetch;
mod threshold;

pub use backoff::BackoffConfig;
pub use fetch::{QuotaFetchConfig, UpstreamProxyConfig};
pub use threshold::ThresholdConfig;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Root configuration for the resilience core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Validate)]
pub struct ResilienceConfig {
    /// Backoff ledger tiers and defaults
    #[serde(default)]
    #[validate(nested)]
    pub backoff: BackoffConfig,
    /// Upstream quota fetching
    #[serde(default)]
    #[validate(nested)]
    pub quota: QuotaFetchConfig,
    /// Pre-flight utilization ceiling
    #[serde(default)]
    #[validate(nested)]
    pub threshold: ThresholdConfig,
}
