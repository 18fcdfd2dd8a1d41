//! Rate limit classification models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};

/// Classified cause of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitReason {
    /// Reason could not be determined from status or body
    #[default]
    Unknown,
    /// The account's quota has been completely used up
    QuotaExhausted,
    /// Requests per minute/second limit has been hit
    RateLimitExceeded,
    /// The model is temporarily overloaded
    ModelCapacityExhausted,
    /// Upstream 5xx (or 404)
    ServerError,
}

impl RateLimitReason {
    /// Stable string form, matching the provider's structured `reason` values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::QuotaExhausted => "QUOTA_EXHAUSTED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ModelCapacityExhausted => "MODEL_CAPACITY_EXHAUSTED",
            Self::ServerError => "SERVER_ERROR",
        }
    }

    /// Map a structured `reason` detail (e.g. `"QUOTA_EXHAUSTED"`) to a variant.
    pub fn from_structured(reason: &str) -> Option<Self> {
        match reason.trim() {
            "QUOTA_EXHAUSTED" => Some(Self::QuotaExhausted),
            "RATE_LIMIT_EXCEEDED" => Some(Self::RateLimitExceeded),
            "MODEL_CAPACITY_EXHAUSTED" => Some(Self::ModelCapacityExhausted),
            _ => None,
        }
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ServerError)
    }
}

impl fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a lockout applies to a whole account or to one model under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "scope", content = "model", rename_all = "snake_case")]
pub enum LimitScope {
    #[default]
    Account,
    Model(String),
}

impl LimitScope {
    pub fn model(name: impl Into<String>) -> Self {
        Self::Model(name.into())
    }

    /// `None` and empty names both mean account-wide.
    pub fn from_model(model: Option<&str>) -> Self {
        match model {
            Some(m) if !m.trim().is_empty() => Self::Model(m.to_string()),
            _ => Self::Account,
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::Account => None,
            Self::Model(name) => Some(name),
        }
    }

    pub fn is_model_level(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

/// Outcome of classifying one upstream failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitInfo {
    /// Why the limit was triggered
    pub reason: RateLimitReason,
    /// When the failure was recorded
    pub detected_at: SystemTime,
    /// When the lockout expires
    pub reset_time: SystemTime,
    /// Wait applied, in whole seconds
    pub retry_after_sec: u64,
    /// Account-wide or model-scoped
    pub scope: LimitScope,
}

impl RateLimitInfo {
    pub fn is_model_level(&self) -> bool {
        self.scope.is_model_level()
    }

    /// Time left until `reset_time`, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.reset_time.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self) -> bool {
        self.reset_time <= SystemTime::now()
    }
}
