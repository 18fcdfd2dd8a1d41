use quotarelay_types::{LimitScope, RateLimitInfo, RateLimitReason};
use std::time::{Duration, SystemTime};

use super::classifier::{classify, is_server_status};
use super::parser;
use super::rate_limit_key::RateLimitKey;
use super::tracker::RateLimitTracker;
use super::duration_to_secs_ceil;

impl RateLimitTracker {
    /// Classify an upstream failure, derive its wait and record the lockout.
    pub fn parse_from_error(
        &self,
        account_id: &str,
        status: u16,
        retry_after_header: Option<&str>,
        body: &str,
        scope: &LimitScope,
    ) -> RateLimitInfo {
        let reason = classify(status, body);
        self.record_failure(account_id, status, retry_after_header, body, scope, reason)
    }

    /// Same as [`Self::parse_from_error`] with a caller-classified reason.
    /// 5xx and 404 still force `ServerError`.
    pub fn parse_from_error_with_reason(
        &self,
        account_id: &str,
        status: u16,
        retry_after_header: Option<&str>,
        body: &str,
        scope: &LimitScope,
        reason: RateLimitReason,
    ) -> RateLimitInfo {
        let reason = if is_server_status(status) { RateLimitReason::ServerError } else { reason };
        self.record_failure(account_id, status, retry_after_header, body, scope, reason)
    }

    fn record_failure(
        &self,
        account_id: &str,
        status: u16,
        retry_after_header: Option<&str>,
        body: &str,
        scope: &LimitScope,
        reason: RateLimitReason,
    ) -> RateLimitInfo {
        let explicit = retry_after_header
            .and_then(parser::parse_retry_after_header)
            .or_else(|| parser::extract_from_body(body));

        let key = RateLimitKey::for_lockout(account_id, reason, scope);
        let mut state = self.state.write();
        let now = SystemTime::now();

        // ServerError never touches the counter, so transient 5xx bursts
        // cannot escalate a later quota tier.
        let failure_count = if reason.is_server_error() {
            state.failures.get(account_id).map_or(0, |c| c.count)
        } else {
            state.record_failure(account_id, now, self.policy.failure_decay)
        };

        let source = if explicit.is_some() { "explicit" } else { "tier" };
        let wait = explicit.unwrap_or_else(|| self.policy.tier_for(reason, failure_count));
        let wait = parser::clamp_with_floor(wait, self.policy.min_retry);
        let retry_after_sec = duration_to_secs_ceil(wait);

        let info = RateLimitInfo {
            reason,
            detected_at: now,
            reset_time: now
                .checked_add(Duration::from_secs(retry_after_sec))
                .unwrap_or(now + parser::MAX_RETRY_DELAY),
            retry_after_sec,
            scope: key.scope(),
        };
        state.insert(key.clone(), info.clone());
        drop(state);

        tracing::warn!(
            key = %key,
            status,
            reason = %reason,
            failure_count,
            retry_after_sec,
            source,
            "upstream failure recorded"
        );
        info
    }
}
