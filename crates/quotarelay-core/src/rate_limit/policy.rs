use quotarelay_types::{BackoffConfig, RateLimitReason};
use std::time::Duration;

/// Tiered defaults used when neither the header nor the body names a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub quota_exhausted_steps: Vec<Duration>,
    pub model_capacity_steps: Vec<Duration>,
    pub rate_limit_default: Duration,
    pub server_error_default: Duration,
    pub unknown_default: Duration,
    pub min_retry: Duration,
    pub failure_decay: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &BackoffConfig) -> Self {
        let secs = |v: &[u64]| v.iter().copied().map(Duration::from_secs).collect::<Vec<_>>();
        Self {
            quota_exhausted_steps: secs(&config.quota_exhausted_steps_secs),
            model_capacity_steps: secs(&config.model_capacity_steps_secs),
            rate_limit_default: Duration::from_secs(config.rate_limit_default_secs),
            server_error_default: Duration::from_secs(config.server_error_default_secs),
            unknown_default: Duration::from_secs(config.unknown_default_secs),
            min_retry: Duration::from_secs(config.min_retry_secs),
            failure_decay: Duration::from_secs(config.failure_decay_secs),
        }
    }

    /// Default wait for `reason` given the effective failure count
    /// (already incremented for this failure).
    pub fn tier_for(&self, reason: RateLimitReason, failure_count: u32) -> Duration {
        match reason {
            RateLimitReason::QuotaExhausted => {
                step_at(&self.quota_exhausted_steps, failure_count, self.unknown_default)
            },
            RateLimitReason::ModelCapacityExhausted => {
                step_at(&self.model_capacity_steps, failure_count, self.rate_limit_default)
            },
            RateLimitReason::RateLimitExceeded => self.rate_limit_default,
            RateLimitReason::ServerError => self.server_error_default,
            RateLimitReason::Unknown => self.unknown_default,
        }
    }

    /// Largest wait the policy can produce on its own.
    pub fn max_tier(&self) -> Duration {
        self.quota_exhausted_steps
            .iter()
            .chain(self.model_capacity_steps.iter())
            .copied()
            .chain([self.rate_limit_default, self.server_error_default, self.unknown_default])
            .max()
            .unwrap_or(self.unknown_default)
    }
}

/// `steps[count - 1]`, clamped to the last step.
fn step_at(steps: &[Duration], failure_count: u32, fallback: Duration) -> Duration {
    let index = (failure_count.max(1) - 1) as usize;
    steps.get(index).or_else(|| steps.last()).copied().unwrap_or(fallback)
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
