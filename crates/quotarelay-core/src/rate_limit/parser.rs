//! Retry delay extraction.
//!
//! Upstream error bodies carry wait hints in many shapes. Each shape is a
//! pure strategy returning `Option<Duration>`; they run in a fixed order and
//! the first hit wins:
//!
//! 1. structured `google.rpc.RetryInfo` `retryDelay` (`"0.847655010s"`)
//! 2. structured `metadata.quotaResetDelay` (`"5s"`, `"1h2m3s"`)
//! 3. structured numeric `error.retry_after`
//! 4. free text: `after 42s`, `2m 30s`, `backoff for 60s`, `reset in 30 seconds`

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use super::duration_to_secs_ceil;

/// Smallest wait ever handed out; protects against hot retry loops.
pub const MIN_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Largest wait ever handed out. Upstream hints beyond this are treated as
/// this value so the lockout expiry stays representable.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryDelayError {
    #[error("no retry delay found in error body")]
    NotFound,
    #[error("invalid duration string: '{0}'")]
    InvalidFormat(String),
}

type Strategy = fn(&str) -> Option<Duration>;

const STRUCTURED_STRATEGIES: &[(&str, Strategy)] = &[
    ("retry_info", retry_info_delay),
    ("quota_reset_delay", quota_reset_delay),
    ("retry_after_field", retry_after_field),
];

const FREE_TEXT_STRATEGIES: &[(&str, Strategy)] = &[
    ("after_seconds", after_seconds),
    ("minutes_seconds", minutes_seconds),
    ("backoff_directive", backoff_directive),
    ("seconds_phrase", seconds_phrase),
];

static UNIT_REGEX: OnceLock<Regex> = OnceLock::new();
static AFTER_REGEX: OnceLock<Regex> = OnceLock::new();
static MIN_SEC_REGEX: OnceLock<Regex> = OnceLock::new();
static BACKOFF_REGEX: OnceLock<Regex> = OnceLock::new();
static SECONDS_PHRASE_REGEX: OnceLock<Regex> = OnceLock::new();
static DURATION_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn unit_regex() -> &'static Regex {
    UNIT_REGEX.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|h|m|s)").expect("Unit regex is valid")
    })
}

fn after_regex() -> &'static Regex {
    AFTER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bafter\s+(\d+(?:\.\d+)?)s\b").expect("After regex is valid")
    })
}

fn min_sec_regex() -> &'static Regex {
    MIN_SEC_REGEX
        .get_or_init(|| Regex::new(r"(?i)\b(\d+)m\s*(\d+)s\b").expect("Min sec regex is valid"))
}

fn backoff_regex() -> &'static Regex {
    BACKOFF_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:backoff for|try again in|wait)\s*(\d+(?:\.\d+)?)s\b")
            .expect("Backoff regex is valid")
    })
}

fn seconds_phrase_regex() -> &'static Regex {
    SECONDS_PHRASE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:will reset in|reset in|retry after|try again in|wait)\s+(\d+)\s*seconds?\b")
            .expect("Seconds phrase regex is valid")
    })
}

fn duration_token_regex() -> &'static Regex {
    DURATION_TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\d+(?:\.\d+)?\s*(?:ms|s|m|h|sec|second|minute|hour)")
            .expect("Duration token regex is valid")
    })
}

/// Parse a Go-style duration literal: `"2h1m1s"`, `"500ms"`, `"0.847655010s"`.
pub fn parse_duration_string(s: &str) -> Result<Duration, RetryDelayError> {
    let invalid = || RetryDelayError::InvalidFormat(s.to_string());
    let mut rest = s.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = 0.0_f64;
    while !rest.is_empty() {
        let caps = unit_regex().captures(rest).ok_or_else(invalid)?;
        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit_secs = match &caps[2] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            _ => 1e-9,
        };
        total += value * unit_secs;
        rest = rest[caps[0].len()..].trim_start();
    }

    let parsed = Duration::try_from_secs_f64(total).map_err(|_| invalid())?;
    tracing::debug!(input = %s, seconds = parsed.as_secs_f64(), "parsed duration literal");
    Ok(parsed)
}

/// `Retry-After` header as whole seconds. Empty or non-numeric yields `None`.
pub fn parse_retry_after_header(value: &str) -> Option<Duration> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u64>().ok().map(Duration::from_secs)
}

/// Standalone extraction: rounds up to whole seconds and applies the floor.
/// Unknown formats are an error.
pub fn parse_retry_delay(body: &str) -> Result<Duration, RetryDelayError> {
    extract_from_body(body).map(clamp_to_floor).ok_or(RetryDelayError::NotFound)
}

/// Round up to whole seconds, never below [`MIN_RETRY_DELAY`] nor above
/// [`MAX_RETRY_DELAY`].
pub fn clamp_to_floor(d: Duration) -> Duration {
    clamp_with_floor(d, MIN_RETRY_DELAY)
}

pub(crate) fn clamp_with_floor(d: Duration, floor: Duration) -> Duration {
    let secs = duration_to_secs_ceil(d).max(floor.as_secs());
    Duration::from_secs(secs.min(MAX_RETRY_DELAY.as_secs()))
}

/// Run every body strategy in priority order.
pub fn extract_from_body(body: &str) -> Option<Duration> {
    if let Some(found) = run_strategies(STRUCTURED_STRATEGIES, body) {
        return Some(found);
    }
    if is_bare_quota_exhausted(body) {
        tracing::debug!("quota exhausted phrase without duration, skipping free-text parsing");
        return None;
    }
    run_strategies(FREE_TEXT_STRATEGIES, body)
}

fn run_strategies(strategies: &[(&str, Strategy)], body: &str) -> Option<Duration> {
    strategies.iter().find_map(|(name, strategy)| {
        let found = strategy(body)?;
        tracing::debug!(strategy = name, seconds = found.as_secs_f64(), "retry delay extracted");
        Some(found)
    })
}

/// "quota exhausted" alone carries no duration.
fn is_bare_quota_exhausted(body: &str) -> bool {
    body.to_lowercase().contains("quota exhausted") && !duration_token_regex().is_match(body)
}

fn error_details(body: &str) -> Option<Vec<Value>> {
    let trimmed = body.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let json: Value = serde_json::from_str(trimmed).ok()?;
    json.get("error")?.get("details")?.as_array().cloned()
}

/// `{"@type": "...google.rpc.RetryInfo", "retryDelay": "0.847655010s"}`
pub fn retry_info_delay(body: &str) -> Option<Duration> {
    error_details(body)?.iter().find_map(|detail| {
        let is_retry_info = detail
            .get("@type")
            .and_then(Value::as_str)
            .map_or(true, |t| t.ends_with("RetryInfo"));
        if !is_retry_info {
            return None;
        }
        let delay = detail.get("retryDelay").and_then(Value::as_str)?;
        parse_duration_string(delay).ok()
    })
}

/// `{"metadata": {"quotaResetDelay": "5s"}}`
pub fn quota_reset_delay(body: &str) -> Option<Duration> {
    error_details(body)?.iter().find_map(|detail| {
        let delay = detail.get("metadata")?.get("quotaResetDelay")?.as_str()?;
        parse_duration_string(delay).ok()
    })
}

/// `{"error": {"retry_after": 30}}`
pub fn retry_after_field(body: &str) -> Option<Duration> {
    let trimmed = body.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let json: Value = serde_json::from_str(trimmed).ok()?;
    json.get("error")?.get("retry_after")?.as_u64().map(Duration::from_secs)
}

/// `"Your quota will reset after 42s."`
pub fn after_seconds(body: &str) -> Option<Duration> {
    let caps = after_regex().captures(body)?;
    caps[1].parse::<f64>().ok().and_then(|s| Duration::try_from_secs_f64(s).ok())
}

/// `"Try again in 2m 30s"`
pub fn minutes_seconds(body: &str) -> Option<Duration> {
    let caps = min_sec_regex().captures(body)?;
    let minutes = caps[1].parse::<u64>().ok()?;
    let seconds = caps[2].parse::<u64>().ok()?;
    let total = minutes.checked_mul(60)?.checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

/// `"backoff for 60s"`, `"try again in 5s"`, `"(wait 5s)"`
pub fn backoff_directive(body: &str) -> Option<Duration> {
    let caps = backoff_regex().captures(body)?;
    caps[1].parse::<f64>().ok().and_then(|s| Duration::try_from_secs_f64(s).ok())
}

/// `"quota will reset in 30 seconds"`, `"retry after 45 seconds"`
pub fn seconds_phrase(body: &str) -> Option<Duration> {
    let caps = seconds_phrase_regex().captures(body)?;
    caps[1].parse::<u64>().ok().map(Duration::from_secs)
}
