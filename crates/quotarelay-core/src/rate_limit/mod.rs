//! Backoff ledger for upstream failures.
//!
//! Classifies upstream errors into a [`RateLimitReason`], derives a wait
//! duration from headers or heterogeneous error bodies, and keeps
//! per-account / per-model lockouts plus a time-decayed failure counter.
//!
//! - `classifier` - status + body -> reason
//! - `parser` - ordered duration extraction strategies
//! - `policy` - tiered defaults and safety floor
//! - `tracker` - lockout and failure-counter state
//! - `error_parsing` - `parse_from_error` (classify + extract + record)
//! - `lockout` - manual overrides from provider-reported reset times

pub mod classifier;
mod error_parsing;
mod limiter;
mod lockout;
pub mod parser;
mod policy;
mod rate_limit_key;
mod tracker;

#[cfg(test)]
mod tests;

pub use classifier::classify;
pub use limiter::RateLimiter;
pub use parser::{parse_duration_string, parse_retry_after_header, parse_retry_delay, RetryDelayError};
pub use policy::BackoffPolicy;
pub use quotarelay_types::{LimitScope, RateLimitInfo, RateLimitReason};
pub use rate_limit_key::RateLimitKey;
pub use tracker::{LockoutSnapshot, RateLimitTracker};

use std::time::Duration;

/// Round a duration up to whole seconds.
pub(crate) fn duration_to_secs_ceil(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}
