use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::retry_after::RetryAfterProvider;
use crate::rate_limit::duration_to_secs_ceil;

pub const THRESHOLD_ERROR_CODE: &str = "quota_threshold_exceeded";

/// A request rejected locally because cached utilization is at or above the
/// configured ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaThresholdError {
    pub model: String,
    pub provider: String,
    pub utilization: f64,
    pub threshold: f64,
    pub resets_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    model: &'a str,
    utilization: f64,
    threshold: f64,
    reset_time: String,
    reset_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
}

impl QuotaThresholdError {
    pub fn new(
        model: impl Into<String>,
        provider: impl Into<String>,
        utilization: f64,
        threshold: f64,
        resets_at: DateTime<Utc>,
    ) -> Self {
        Self {
            model: model.into(),
            provider: provider.into(),
            utilization,
            threshold,
            resets_at,
        }
    }

    /// Time until reset, computed now; zero once the reset time has passed.
    pub fn remaining(&self) -> Duration {
        (self.resets_at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }

    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(duration_to_secs_ceil(self.remaining())),
        );
        headers
    }

    /// `{"error": {...}}` payload; `provider` is omitted when empty.
    pub fn body(&self) -> serde_json::Value {
        let remaining = self.remaining();
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: THRESHOLD_ERROR_CODE,
                message: self.to_string(),
                model: &self.model,
                utilization: self.utilization,
                threshold: self.threshold,
                reset_time: format_reset_duration(remaining),
                reset_seconds: duration_to_secs_ceil(remaining),
                provider: (!self.provider.is_empty()).then_some(self.provider.as_str()),
            },
        };
        serde_json::to_value(envelope).unwrap_or_else(|_| {
            serde_json::json!({"error": {"code": THRESHOLD_ERROR_CODE, "message": self.to_string()}})
        })
    }
}

impl fmt::Display for QuotaThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quota threshold exceeded for model {} ({:.1}% >= {:.1}% threshold)",
            self.model, self.utilization, self.threshold
        )?;
        if !self.provider.is_empty() {
            write!(f, " via provider {}", self.provider)?;
        }
        Ok(())
    }
}

impl std::error::Error for QuotaThresholdError {}

impl RetryAfterProvider for QuotaThresholdError {
    fn retry_after(&self) -> Option<Duration> {
        Some(self.remaining())
    }
}

impl IntoResponse for QuotaThresholdError {
    fn into_response(self) -> Response {
        (self.status_code(), self.headers(), Json(self.body())).into_response()
    }
}

/// Human reset string: `0s`, `45s`, `2m30s`, `1h0m0s`. A positive
/// sub-second remainder shows as `1s`; otherwise rounds to the nearest second.
pub fn format_reset_duration(d: Duration) -> String {
    let secs = if !d.is_zero() && d < Duration::from_secs(1) {
        1
    } else {
        d.as_secs() + u64::from(d.subsec_nanos() >= 500_000_000)
    };

    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
