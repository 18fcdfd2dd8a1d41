//! Failure reason classification.
//!
//! Status code first: any 5xx or 404 is a [`RateLimitReason::ServerError`]
//! regardless of what the body says. Otherwise the structured
//! `error.details[].reason` field wins, then lower-cased text matching.

use quotarelay_types::RateLimitReason;
use serde_json::Value;

/// Primary phrases, checked in order.
const PRIMARY_PHRASES: &[(&str, RateLimitReason)] = &[
    ("quota exhausted", RateLimitReason::QuotaExhausted),
    ("rate limit exceeded", RateLimitReason::RateLimitExceeded),
    ("model capacity", RateLimitReason::ModelCapacityExhausted),
];

/// Fallback phrases. Per-minute/per-second wording is checked before the
/// generic "exhausted" wording: TPM errors read "Resource has been exhausted
/// ... 'Tokens per minute' exceeded" and are rate limits, not quota.
const FALLBACK_PHRASES: &[(&str, RateLimitReason)] = &[
    ("per minute", RateLimitReason::RateLimitExceeded),
    ("per second", RateLimitReason::RateLimitExceeded),
    ("too many requests", RateLimitReason::RateLimitExceeded),
    ("rate limit", RateLimitReason::RateLimitExceeded),
    ("model overloaded", RateLimitReason::ModelCapacityExhausted),
    ("overloaded", RateLimitReason::ModelCapacityExhausted),
    ("resource exhausted", RateLimitReason::QuotaExhausted),
    ("resource has been exhausted", RateLimitReason::QuotaExhausted),
    ("quota exceeded", RateLimitReason::QuotaExhausted),
];

/// Classify an upstream failure. Never fails.
pub fn classify(status: u16, body: &str) -> RateLimitReason {
    if is_server_status(status) {
        return RateLimitReason::ServerError;
    }
    classify_body(body)
}

/// 5xx and 404 always force `ServerError`.
pub fn is_server_status(status: u16) -> bool {
    status >= 500 || status == 404
}

/// Classify from the body alone.
pub fn classify_body(body: &str) -> RateLimitReason {
    if let Some(reason) = structured_reason(body) {
        return reason;
    }

    let lower = body.to_lowercase();
    PRIMARY_PHRASES
        .iter()
        .chain(FALLBACK_PHRASES)
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, reason)| *reason)
        .unwrap_or(RateLimitReason::Unknown)
}

/// First recognised `error.details[].reason` value.
fn structured_reason(body: &str) -> Option<RateLimitReason> {
    let trimmed = body.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let json: Value = serde_json::from_str(trimmed).ok()?;
    json.get("error")?
        .get("details")?
        .as_array()?
        .iter()
        .filter_map(|detail| detail.get("reason").and_then(Value::as_str))
        .find_map(RateLimitReason::from_structured)
}
