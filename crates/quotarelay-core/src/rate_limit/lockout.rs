use chrono::{DateTime, Utc};
use quotarelay_types::{LimitScope, RateLimitInfo, RateLimitReason};
use std::time::{Duration, SystemTime};

use super::duration_to_secs_ceil;
use super::rate_limit_key::RateLimitKey;
use super::tracker::RateLimitTracker;

impl RateLimitTracker {
    /// Lock until a provider-reported instant, bypassing duration extraction.
    /// Keyed the same way as `parse_from_error`. Counters are untouched.
    pub fn set_lockout_until(
        &self,
        account_id: &str,
        reset_time: SystemTime,
        reason: RateLimitReason,
        scope: &LimitScope,
    ) {
        let now = SystemTime::now();
        let wait = reset_time.duration_since(now).unwrap_or(Duration::ZERO);
        let key = RateLimitKey::for_lockout(account_id, reason, scope);

        let info = RateLimitInfo {
            reason,
            detected_at: now,
            reset_time,
            retry_after_sec: duration_to_secs_ceil(wait),
            scope: key.scope(),
        };
        self.state.write().insert(key.clone(), info);

        tracing::info!(
            key = %key,
            reason = %reason,
            wait_secs = wait.as_secs(),
            "lockout set from reported reset time"
        );
    }

    /// RFC 3339 variant. Returns `false` for unparseable or pre-epoch input.
    pub fn set_lockout_until_iso(
        &self,
        account_id: &str,
        reset_time_str: &str,
        reason: RateLimitReason,
        scope: &LimitScope,
    ) -> bool {
        let parsed = match DateTime::parse_from_rfc3339(reset_time_str.trim()) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    account_id,
                    input = reset_time_str,
                    error = %e,
                    "failed to parse reset time"
                );
                return false;
            },
        };

        if parsed.timestamp() < 0 {
            tracing::warn!(account_id, input = reset_time_str, "reset time before unix epoch");
            return false;
        }

        let reset_time = SystemTime::from(parsed);
        self.set_lockout_until(account_id, reset_time, reason, scope);
        true
    }
}
