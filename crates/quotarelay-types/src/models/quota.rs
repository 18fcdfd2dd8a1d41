//! Quota data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-model quota reported by the Antigravity `fetchAvailableModels` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelQuota {
    /// Model identifier (e.g. "gemini-2.5-pro")
    pub name: String,
    /// Human-readable name, falls back to `name`
    pub display_name: String,
    /// Remaining quota in [0, 1]
    pub remaining_fraction: f64,
    /// Time when quota resets, if reported
    #[serde(default)]
    pub reset_time: Option<DateTime<Utc>>,
}

impl ModelQuota {
    pub fn new(name: impl Into<String>, remaining_fraction: f64) -> Self {
        let name = name.into();
        Self { display_name: name.clone(), name, remaining_fraction, reset_time: None }
    }

    /// Remaining percentage (0-100), always derived from the fraction.
    pub fn remaining_percent(&self) -> f64 {
        self.remaining_fraction * 100.0
    }
}

/// Aggregated quota data for an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaData {
    /// Per-model quota information
    pub models: Vec<ModelQuota>,
    /// Last time quota was updated
    pub last_updated: DateTime<Utc>,
    /// Whether the account lacks access (HTTP 403)
    #[serde(default)]
    pub is_forbidden: bool,
}

impl QuotaData {
    /// Create empty quota data.
    pub fn new() -> Self {
        Self { models: Vec::new(), last_updated: Utc::now(), is_forbidden: false }
    }

    /// Quota state for an account whose project access is forbidden.
    pub fn forbidden() -> Self {
        Self { is_forbidden: true, ..Self::new() }
    }

    /// Add a model quota entry.
    pub fn add_model(&mut self, model: ModelQuota) {
        self.models.push(model);
    }

    /// Get quota for a specific model by exact name.
    pub fn get_model(&self, name: &str) -> Option<&ModelQuota> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Get the minimum remaining percentage across all models.
    pub fn min_remaining_percent(&self) -> Option<f64> {
        self.models.iter().map(ModelQuota::remaining_percent).reduce(f64::min)
    }
}

impl Default for QuotaData {
    fn default() -> Self {
        Self::new()
    }
}
