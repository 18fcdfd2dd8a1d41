//! # QuotaRelay Core
//!
//! Resilience and quota tracking for a multi-provider AI proxy.
//!
//! ```text
//! quotarelay-core/src/
//! ├── rate_limit/   # classifier, duration extraction, backoff ledger
//! ├── quota/        # per-provider quota checkers (Antigravity, Claude)
//! ├── threshold/    # local pre-flight rejection (HTTP 429)
//! ├── management/   # read-only quota / lockout endpoints
//! ├── modules/      # config loading, logging
//! └── utils/        # HTTP client construction
//! ```
//!
//! The ledger and the quota caches are plain values constructed once at
//! startup and shared through `Arc`; nothing here is global.

#![allow(
    clippy::significant_drop_tightening,
    reason = "RwLock guards in the ledger are held for the whole read-modify-write cycle"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(
    clippy::wildcard_enum_match_arm,
    reason = "Upstream JSON is matched permissively for forward compatibility"
)]
// Test-only lints: allow panic!, expect, float comparisons in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::needless_collect,
        clippy::assertions_on_result_states
    )
)]

pub mod error;
pub mod management;
pub mod modules;
pub mod quota;
pub mod rate_limit;
pub mod threshold;
pub mod utils;

pub use error::{AppError, AppResult};
pub use quota::{AntigravityQuotaChecker, ClaudeQuotaChecker, QuotaChecker, QuotaError};
pub use rate_limit::{RateLimitTracker, RateLimiter};
pub use threshold::{QuotaThresholdError, RetryAfterProvider, ThresholdGuard, ThresholdGuards};
