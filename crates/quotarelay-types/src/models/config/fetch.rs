//! Upstream quota fetch configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Upstream proxy configuration for quota requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamProxyConfig {
    /// Route quota requests through `url`
    #[serde(default)]
    pub enabled: bool,
    /// Proxy URL (http, https or socks5)
    #[serde(default)]
    pub url: String,
}

/// Endpoints, timeouts and retry settings for quota fetching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct QuotaFetchConfig {
    /// Base URL of the Antigravity internal API
    #[serde(default = "default_antigravity_base_url")]
    pub antigravity_base_url: String,
    /// Anthropic OAuth usage endpoint
    #[serde(default = "default_claude_usage_url")]
    pub claude_usage_url: String,
    /// Per-request timeout in seconds
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Attempts on transient network failure
    #[validate(range(min = 1_u32, max = 10_u32))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Freshness window of cached Claude usage
    #[serde(default = "default_claude_cache_ttl_secs")]
    pub claude_cache_ttl_secs: u64,
    /// Optional upstream proxy
    #[serde(default)]
    #[validate(nested)]
    pub upstream_proxy: UpstreamProxyConfig,
}

impl Default for QuotaFetchConfig {
    fn default() -> Self {
        Self {
            antigravity_base_url: default_antigravity_base_url(),
            claude_usage_url: default_claude_usage_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            claude_cache_ttl_secs: default_claude_cache_ttl_secs(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_antigravity_base_url() -> String {
    "https://cloudcode-pa.googleapis.com".to_string()
}

fn default_claude_usage_url() -> String {
    "https://api.anthropic.com/api/oauth/usage".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_claude_cache_ttl_secs() -> u64 {
    300
}
