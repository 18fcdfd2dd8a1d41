use parking_lot::RwLock;
use quotarelay_types::{LimitScope, RateLimitInfo, RateLimitReason};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use super::duration_to_secs_ceil;
use super::policy::BackoffPolicy;
use super::rate_limit_key::RateLimitKey;

#[derive(Debug, Clone)]
pub(super) struct LockoutEntry {
    pub(super) info: RateLimitInfo,
    pub(super) expires_at: SystemTime,
}

impl LockoutEntry {
    fn remaining(&self, now: SystemTime) -> Option<Duration> {
        self.expires_at.duration_since(now).ok().filter(|d| !d.is_zero())
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct FailureCounter {
    pub(super) count: u32,
    pub(super) last_failure: SystemTime,
}

/// Both maps live behind one lock so the decay-increment-insert cycle in
/// `parse_from_error` is atomic.
#[derive(Debug, Default)]
pub(super) struct LedgerState {
    pub(super) lockouts: HashMap<RateLimitKey, LockoutEntry>,
    pub(super) failures: HashMap<String, FailureCounter>,
}

impl LedgerState {
    /// Apply time decay, bump the counter and return the new count.
    pub(super) fn record_failure(
        &mut self,
        account_id: &str,
        now: SystemTime,
        decay: Duration,
    ) -> u32 {
        let counter = self
            .failures
            .entry(account_id.to_string())
            .or_insert(FailureCounter { count: 0, last_failure: now });
        let elapsed = now.duration_since(counter.last_failure).unwrap_or(Duration::ZERO);
        if elapsed > decay {
            tracing::debug!(
                account_id,
                elapsed_secs = elapsed.as_secs(),
                "failure count decayed, reset to 0"
            );
            counter.count = 0;
        }
        counter.count = counter.count.saturating_add(1);
        counter.last_failure = now;
        counter.count
    }

    pub(super) fn insert(&mut self, key: RateLimitKey, info: RateLimitInfo) {
        let expires_at = info.reset_time;
        self.lockouts.insert(key, LockoutEntry { info, expires_at });
    }
}

/// Point-in-time view of one unexpired lockout.
#[derive(Debug, Clone, Serialize)]
pub struct LockoutSnapshot {
    pub key: String,
    pub account_id: String,
    pub model: Option<String>,
    pub reason: RateLimitReason,
    pub retry_after_sec: u64,
    pub remaining_secs: u64,
    pub reset_at: chrono::DateTime<chrono::Utc>,
}

/// Per-account / per-model lockouts plus the time-decayed failure counter.
pub struct RateLimitTracker {
    pub(super) policy: BackoffPolicy,
    pub(super) state: RwLock<LedgerState>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::with_policy(BackoffPolicy::default())
    }

    pub fn with_policy(policy: BackoffPolicy) -> Self {
        Self { policy, state: RwLock::new(LedgerState::default()) }
    }

    /// Override only the QUOTA_EXHAUSTED step list.
    pub fn with_quota_steps(steps: Vec<Duration>) -> Self {
        Self::with_policy(BackoffPolicy { quota_exhausted_steps: steps, ..BackoffPolicy::default() })
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Account-wide lock blocks every model; a model lock blocks only that model.
    pub fn is_rate_limited(&self, account_id: &str, scope: &LimitScope) -> bool {
        !self.get_remaining_wait(account_id, scope).is_zero()
    }

    /// Longest remaining time among the applicable unexpired entries.
    pub fn get_remaining_wait(&self, account_id: &str, scope: &LimitScope) -> Duration {
        let now = SystemTime::now();
        let state = self.state.read();

        let account_wait = state
            .lockouts
            .get(&RateLimitKey::account(account_id))
            .and_then(|e| e.remaining(now))
            .unwrap_or(Duration::ZERO);

        let model_wait = scope
            .model_name()
            .and_then(|m| state.lockouts.get(&RateLimitKey::model(account_id, m)))
            .and_then(|e| e.remaining(now))
            .unwrap_or(Duration::ZERO);

        account_wait.max(model_wait)
    }

    /// Whole-second variant of [`Self::get_remaining_wait`].
    pub fn get_remaining_wait_secs(&self, account_id: &str, scope: &LimitScope) -> u64 {
        duration_to_secs_ceil(self.get_remaining_wait(account_id, scope))
    }

    /// Reset the failure counter and drop the account-wide lockout.
    /// Model-scoped lockouts for the account stay until they expire.
    pub fn mark_success(&self, account_id: &str) {
        let mut state = self.state.write();
        if state.failures.remove(account_id).is_some() {
            tracing::debug!(account_id, "request success, reset failure count");
        }
        state.lockouts.remove(&RateLimitKey::account(account_id));
    }

    /// Exact entry for the scope, if still active.
    pub fn get(&self, account_id: &str, scope: &LimitScope) -> Option<RateLimitInfo> {
        let now = SystemTime::now();
        let state = self.state.read();
        state
            .lockouts
            .get(&RateLimitKey::from_scope(account_id, scope))
            .filter(|e| e.expires_at > now)
            .map(|e| e.info.clone())
    }

    /// Effective failure count after time decay.
    pub fn failure_count(&self, account_id: &str) -> u32 {
        let now = SystemTime::now();
        let state = self.state.read();
        state
            .failures
            .get(account_id)
            .filter(|c| {
                now.duration_since(c.last_failure).unwrap_or(Duration::ZERO)
                    <= self.policy.failure_decay
            })
            .map_or(0, |c| c.count)
    }

    /// Cleanup expired lockout records. Reads already check expiry, so this
    /// only bounds memory.
    pub fn cleanup_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut state = self.state.write();
        let before = state.lockouts.len();
        state.lockouts.retain(|_, e| e.expires_at > now);
        let removed = before - state.lockouts.len();

        if removed > 0 {
            tracing::debug!(removed, "cleared expired rate limit records");
        }
        removed
    }

    /// Clear every lockout (optimistic reset). Failure counters are kept.
    pub fn clear_all(&self) {
        let mut state = self.state.write();
        let count = state.lockouts.len();
        state.lockouts.clear();
        tracing::warn!(count, "optimistic reset: cleared all rate limit records");
    }

    /// All unexpired lockouts, longest wait first.
    pub fn active_lockouts(&self) -> Vec<LockoutSnapshot> {
        let now = SystemTime::now();
        let state = self.state.read();
        let mut out: Vec<LockoutSnapshot> = state
            .lockouts
            .iter()
            .filter_map(|(key, entry)| {
                let remaining = entry.remaining(now)?;
                Some(LockoutSnapshot {
                    key: key.to_string(),
                    account_id: key.account_id().to_string(),
                    model: key.model_name().map(str::to_string),
                    reason: entry.info.reason,
                    retry_after_sec: entry.info.retry_after_sec,
                    remaining_secs: duration_to_secs_ceil(remaining),
                    reset_at: chrono::DateTime::<chrono::Utc>::from(entry.expires_at),
                })
            })
            .collect();
        out.sort_by(|a, b| b.remaining_secs.cmp(&a.remaining_secs).then(a.key.cmp(&b.key)));
        out
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}
