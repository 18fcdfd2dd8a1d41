use quotarelay_types::{LimitScope, RateLimitInfo, RateLimitReason};
use std::time::{Duration, SystemTime};

use super::tracker::RateLimitTracker;

/// What the routing layer consumes before and after each upstream call.
pub trait RateLimiter: Send + Sync {
    fn is_rate_limited(&self, account_id: &str, scope: &LimitScope) -> bool;

    fn get_remaining_wait(&self, account_id: &str, scope: &LimitScope) -> Duration;

    fn parse_from_error(
        &self,
        account_id: &str,
        status: u16,
        retry_after_header: Option<&str>,
        body: &str,
        scope: &LimitScope,
    ) -> RateLimitInfo;

    fn mark_success(&self, account_id: &str);

    fn set_lockout_until(
        &self,
        account_id: &str,
        reset_time: SystemTime,
        reason: RateLimitReason,
        scope: &LimitScope,
    );
}

impl RateLimiter for RateLimitTracker {
    fn is_rate_limited(&self, account_id: &str, scope: &LimitScope) -> bool {
        RateLimitTracker::is_rate_limited(self, account_id, scope)
    }

    fn get_remaining_wait(&self, account_id: &str, scope: &LimitScope) -> Duration {
        RateLimitTracker::get_remaining_wait(self, account_id, scope)
    }

    fn parse_from_error(
        &self,
        account_id: &str,
        status: u16,
        retry_after_header: Option<&str>,
        body: &str,
        scope: &LimitScope,
    ) -> RateLimitInfo {
        RateLimitTracker::parse_from_error(self, account_id, status, retry_after_header, body, scope)
    }

    fn mark_success(&self, account_id: &str) {
        RateLimitTracker::mark_success(self, account_id);
    }

    fn set_lockout_until(
        &self,
        account_id: &str,
        reset_time: SystemTime,
        reason: RateLimitReason,
        scope: &LimitScope,
    ) {
        RateLimitTracker::set_lockout_until(self, account_id, reset_time, reason, scope);
    }
}
