use chrono::Utc;
use quotarelay_types::{ClaudeQuotaData, QuotaData, ThresholdConfig};

use super::error::QuotaThresholdError;
use crate::quota::{
    AntigravityQuotaChecker, ClaudeQuotaChecker, QuotaChecker, ANTIGRAVITY_PROVIDER,
    CLAUDE_PROVIDER,
};

/// Rejects requests once cached utilization reaches `utilization_percent`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdGuard {
    provider: String,
    utilization_percent: f64,
}

impl ThresholdGuard {
    pub fn new(provider: impl Into<String>, utilization_percent: f64) -> Self {
        Self { provider: provider.into(), utilization_percent }
    }

    /// `None` when the guard is disabled.
    pub fn from_config(provider: impl Into<String>, config: &ThresholdConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(provider, config.utilization_percent))
    }

    pub fn threshold(&self) -> f64 {
        self.utilization_percent
    }

    /// Check the busier of the two Claude windows.
    pub fn check_claude(
        &self,
        model: &str,
        quota: &ClaudeQuotaData,
    ) -> Result<(), QuotaThresholdError> {
        let window = quota.peak_window();
        if window.utilization < self.utilization_percent {
            return Ok(());
        }
        Err(self.reject(model, window.utilization, window.resets_at))
    }

    /// Utilization is `100 - remaining percent` of the named model. Models
    /// absent from the snapshot pass.
    pub fn check_model_quota(
        &self,
        model: &str,
        quota: &QuotaData,
    ) -> Result<(), QuotaThresholdError> {
        let Some(entry) = quota.get_model(model) else {
            return Ok(());
        };
        let utilization = 100.0 - entry.remaining_percent();
        if utilization < self.utilization_percent {
            return Ok(());
        }
        Err(self.reject(model, utilization, entry.reset_time.unwrap_or_else(Utc::now)))
    }

    /// Cache-only check; never touches the network.
    pub fn check_cached_claude(
        &self,
        checker: &ClaudeQuotaChecker,
        account_id: &str,
        model: &str,
    ) -> Result<(), QuotaThresholdError> {
        match checker.cached_quota(account_id) {
            Some(quota) => self.check_claude(model, &quota),
            None => Ok(()),
        }
    }

    /// Cache-only check against the last Antigravity snapshot.
    pub fn check_cached_model(
        &self,
        checker: &AntigravityQuotaChecker,
        account_id: &str,
        model: &str,
    ) -> Result<(), QuotaThresholdError> {
        match checker.cached_quota(account_id) {
            Some(quota) => self.check_model_quota(model, &quota),
            None => Ok(()),
        }
    }

    fn reject(
        &self,
        model: &str,
        utilization: f64,
        resets_at: chrono::DateTime<Utc>,
    ) -> QuotaThresholdError {
        tracing::info!(
            model,
            provider = %self.provider,
            utilization,
            threshold = self.utilization_percent,
            "request rejected by quota threshold"
        );
        QuotaThresholdError::new(
            model,
            self.provider.clone(),
            utilization,
            self.utilization_percent,
            resets_at,
        )
    }
}

/// One guard per provider sharing the configured ceiling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdGuards {
    pub antigravity: Option<ThresholdGuard>,
    pub claude: Option<ThresholdGuard>,
}

impl ThresholdGuards {
    pub fn from_config(config: &ThresholdConfig) -> Self {
        Self {
            antigravity: ThresholdGuard::from_config(ANTIGRAVITY_PROVIDER, config),
            claude: ThresholdGuard::from_config(CLAUDE_PROVIDER, config),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.antigravity.is_some() || self.claude.is_some()
    }
}
