//! # QuotaRelay Types
//!
//! Core types, models, and error definitions for QuotaRelay.
//!
//! This crate provides the foundational type system for the resilience core:
//!
//! - **`error`** - Typed configuration errors
//! - **`models`** - Domain models (rate limit reasons and scopes, quota snapshots, config)
//!
//! ## Architecture Role
//!
//! `quotarelay-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!           quotarelay-types (this crate)
//!                    │
//!                    ▼
//!             quotarelay-core
//!                    │
//!                    ▼
//!            quotarelay-server
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API responses and config files
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, Result};

// Re-export core model types
pub use models::{
    BackoffConfig, ClaudeQuotaData, ClaudeUsageWindow, LimitScope, ModelQuota, QuotaData,
    QuotaFetchConfig, RateLimitInfo, RateLimitReason, ResilienceConfig, ThresholdConfig,
    UpstreamProxyConfig,
};
