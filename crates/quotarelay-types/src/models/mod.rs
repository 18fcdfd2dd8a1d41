//! Core domain models for QuotaRelay.
//!
//! This module contains all shared data structures used across the QuotaRelay workspace.

mod claude_usage;
mod config;
mod quota;
mod rate_limit;

// Re-export all models
pub use claude_usage::{ClaudeQuotaData, ClaudeUsageWindow};
pub use config::{
    BackoffConfig, QuotaFetchConfig, ResilienceConfig, ThresholdConfig, UpstreamProxyConfig,
};
pub use quota::{ModelQuota, QuotaData};
pub use rate_limit::{LimitScope, RateLimitInfo, RateLimitReason};
