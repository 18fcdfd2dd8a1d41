use super::*;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const QUOTA_BODY: &str = r#"{"error": {"message": "quota exhausted"}}"#;
const RATE_BODY: &str = r#"{"error": {"message": "rate limit exceeded"}}"#;
const SERVER_BODY: &str = r#"{"error": {"message": "internal error"}}"#;

fn model(name: &str) -> LimitScope {
    LimitScope::model(name)
}

fn assert_near(actual: u64, expected: u64) {
    assert!(
        actual.abs_diff(expected) <= 2,
        "expected ~{}s, got {}s",
        expected,
        actual
    );
}

#[test]
fn test_quota_tiers_escalate_and_clamp() {
    let tracker = RateLimitTracker::new();
    let scope = model("gemini-2.5-pro");
    let expected = [60, 300, 1800, 7200, 7200, 7200];

    let mut previous = 0;
    for tier in expected {
        let info = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
        assert_eq!(info.reason, RateLimitReason::QuotaExhausted);
        assert_near(info.retry_after_sec, tier);
        assert!(info.retry_after_sec >= previous);
        previous = info.retry_after_sec;
    }
}

#[test]
fn test_server_errors_do_not_escalate_quota_tier() {
    let tracker = RateLimitTracker::new();
    for _ in 0..5 {
        let info = tracker.parse_from_error("acc1", 503, None, SERVER_BODY, &LimitScope::Account);
        assert_eq!(info.reason, RateLimitReason::ServerError);
        assert_near(info.retry_after_sec, 8);
    }
    assert_eq!(tracker.failure_count("acc1"), 0);

    let info = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &model("m"));
    assert_near(info.retry_after_sec, 60);
}

#[test]
fn test_server_status_overrides_quota_text() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error("acc1", 500, None, QUOTA_BODY, &model("m"));
    assert_eq!(info.reason, RateLimitReason::ServerError);
    assert!(!info.is_model_level());
    assert_eq!(tracker.failure_count("acc1"), 0);
}

#[test]
fn test_rate_limit_locks_whole_account() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error("acc1", 429, None, RATE_BODY, &LimitScope::Account);
    assert_eq!(info.reason, RateLimitReason::RateLimitExceeded);
    assert_near(info.retry_after_sec, 5);

    assert!(tracker.is_rate_limited("acc1", &LimitScope::Account));
    assert!(tracker.is_rate_limited("acc1", &model("any-model")));
    assert!(!tracker.is_rate_limited("acc2", &LimitScope::Account));
    assert!(!tracker.is_rate_limited("acc2", &model("any-model")));
}

#[test]
fn test_rate_limit_with_model_is_still_account_wide() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error("acc1", 429, None, RATE_BODY, &model("m1"));
    assert_eq!(info.scope, LimitScope::Account);
    assert!(tracker.is_rate_limited("acc1", &model("m2")));
}

#[test]
fn test_quota_exhausted_scoped_to_model() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &model("model1"));
    assert!(info.is_model_level());

    assert!(tracker.is_rate_limited("acc1", &model("model1")));
    assert!(!tracker.is_rate_limited("acc1", &model("model2")));
    assert!(!tracker.is_rate_limited("acc1", &LimitScope::Account));
}

#[test]
fn test_remaining_wait_takes_longer_entry() {
    let tracker = RateLimitTracker::new();
    tracker.parse_from_error("acc1", 429, Some("30"), RATE_BODY, &LimitScope::Account);
    tracker.parse_from_error("acc1", 429, Some("120"), QUOTA_BODY, &model("m1"));

    let model_wait = tracker.get_remaining_wait_secs("acc1", &model("m1"));
    assert!(model_wait > 115 && model_wait <= 120);

    let account_wait = tracker.get_remaining_wait_secs("acc1", &LimitScope::Account);
    assert!(account_wait > 25 && account_wait <= 30);

    assert_eq!(tracker.get_remaining_wait("acc2", &model("m1")), Duration::ZERO);
}

#[test]
fn test_mark_success_resets_tier() {
    let tracker = RateLimitTracker::new();
    let scope = model("m");
    tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
    tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
    assert_eq!(tracker.failure_count("acc1"), 2);

    tracker.mark_success("acc1");
    assert_eq!(tracker.failure_count("acc1"), 0);

    let info = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
    assert_near(info.retry_after_sec, 60);
}

#[test]
fn test_mark_success_keeps_model_lockouts() {
    let tracker = RateLimitTracker::new();
    tracker.parse_from_error("acc1", 429, None, RATE_BODY, &LimitScope::Account);
    tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &model("m1"));

    tracker.mark_success("acc1");

    assert!(!tracker.is_rate_limited("acc1", &LimitScope::Account));
    assert!(!tracker.is_rate_limited("acc1", &model("m2")));
    // Account success says nothing about m1's quota.
    assert!(tracker.is_rate_limited("acc1", &model("m1")));
}

#[test]
fn test_concurrent_failures_stay_bounded() {
    let tracker = Arc::new(RateLimitTracker::new());
    let scope = model("gemini-2.5-pro");

    std::thread::scope(|s| {
        for _ in 0..10 {
            let tracker = Arc::clone(&tracker);
            let scope = scope.clone();
            s.spawn(move || {
                tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
            });
        }
    });

    assert_eq!(tracker.failure_count("acc1"), 10);
    let wait = tracker.get_remaining_wait_secs("acc1", &scope);
    assert!(wait > 0 && wait <= 7205, "wait: {}", wait);
}

#[test]
fn test_header_takes_precedence_over_body() {
    let tracker = RateLimitTracker::new();
    let body = r#"{"error": {"message": "rate limit exceeded, backoff for 60s"}}"#;
    let info = tracker.parse_from_error("acc1", 429, Some("30"), body, &LimitScope::Account);
    assert_eq!(info.retry_after_sec, 30);
}

#[test]
fn test_body_duration_used_without_header() {
    let tracker = RateLimitTracker::new();
    let body = r#"{"error": {"message": "rate limit exceeded, backoff for 60s"}}"#;
    let info = tracker.parse_from_error("acc1", 429, Some(""), body, &LimitScope::Account);
    assert_eq!(info.retry_after_sec, 60);
}

#[test]
fn test_safety_floor() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error("acc1", 429, Some("1"), "", &LimitScope::Account);
    assert_eq!(info.retry_after_sec, 2);

    let info = tracker.parse_from_error("acc2", 429, Some("0"), "", &LimitScope::Account);
    assert_eq!(info.retry_after_sec, 2);
    assert!(tracker.is_rate_limited("acc2", &LimitScope::Account));
}

#[test]
fn test_huge_retry_after_header_is_capped() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error(
        "acc1",
        429,
        Some("18446744073709551615"),
        RATE_BODY,
        &LimitScope::Account,
    );
    assert_eq!(info.retry_after_sec, parser::MAX_RETRY_DELAY.as_secs());
    assert!(info.reset_time > SystemTime::now());
    assert!(tracker.is_rate_limited("acc1", &LimitScope::Account));
    assert!(tracker.get_remaining_wait("acc1", &LimitScope::Account) <= parser::MAX_RETRY_DELAY);
}

#[test]
fn test_huge_body_duration_is_capped() {
    let tracker = RateLimitTracker::new();
    let body = "rate limit exceeded, backoff for 10000000000000000000s";
    let info = tracker.parse_from_error("acc1", 429, None, body, &LimitScope::Account);
    assert_eq!(info.reason, RateLimitReason::RateLimitExceeded);
    assert_eq!(info.retry_after_sec, parser::MAX_RETRY_DELAY.as_secs());
    assert_eq!(tracker.failure_count("acc1"), 1);

    // minutes overflow u64 seconds; falls through to the quota tier
    let body = "quota exhausted, try again in 999999999999999999m 59s";
    let info = tracker.parse_from_error("acc2", 429, None, body, &model("m"));
    assert_near(info.retry_after_sec, 60);
}

#[test]
fn test_model_capacity_tiers_escalate() {
    let tracker = RateLimitTracker::new();
    let body = r#"{"error": {"message": "model capacity exhausted"}}"#;
    let scope = model("gemini-2.5-pro");

    for expected in [5, 10, 15, 15] {
        let info = tracker.parse_from_error("acc1", 429, None, body, &scope);
        assert_eq!(info.reason, RateLimitReason::ModelCapacityExhausted);
        assert!(!info.is_model_level());
        assert_eq!(info.retry_after_sec, expected);
    }
    assert_eq!(tracker.failure_count("acc1"), 4);
}

#[test]
fn test_unknown_reason_uses_default() {
    let tracker = RateLimitTracker::new();
    let info = tracker.parse_from_error("acc1", 429, None, "nope", &LimitScope::Account);
    assert_eq!(info.reason, RateLimitReason::Unknown);
    assert_near(info.retry_after_sec, 60);
}

#[test]
fn test_parse_with_explicit_reason() {
    let tracker = RateLimitTracker::new();
    let scope = model("claude-sonnet");
    let info = tracker.parse_from_error_with_reason(
        "acc1",
        429,
        None,
        "",
        &scope,
        RateLimitReason::QuotaExhausted,
    );
    assert_eq!(info.reason, RateLimitReason::QuotaExhausted);
    assert_near(info.retry_after_sec, 60);

    let info = tracker.parse_from_error_with_reason(
        "acc1",
        502,
        None,
        "",
        &scope,
        RateLimitReason::QuotaExhausted,
    );
    assert_eq!(info.reason, RateLimitReason::ServerError);
    assert_eq!(tracker.failure_count("acc1"), 1);
}

#[test]
fn test_custom_quota_steps() {
    let tracker = RateLimitTracker::with_quota_steps(vec![
        Duration::from_secs(10),
        Duration::from_secs(20),
    ]);
    let scope = model("m");
    let first = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
    let second = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
    let third = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &scope);
    assert_eq!(first.retry_after_sec, 10);
    assert_eq!(second.retry_after_sec, 20);
    assert_eq!(third.retry_after_sec, 20);
}

#[test]
fn test_failure_count_decays() {
    let tracker = RateLimitTracker::new();
    {
        let mut state = tracker.state.write();
        state.failures.insert(
            "acc1".to_string(),
            tracker::FailureCounter {
                count: 3,
                last_failure: SystemTime::now() - Duration::from_secs(3601),
            },
        );
    }
    assert_eq!(tracker.failure_count("acc1"), 0);

    let info = tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &model("m"));
    assert_near(info.retry_after_sec, 60);
    assert_eq!(tracker.failure_count("acc1"), 1);
}

#[test]
fn test_cleanup_expired() {
    let tracker = RateLimitTracker::new();
    let past = SystemTime::now() - Duration::from_secs(10);
    tracker.set_lockout_until("acc1", past, RateLimitReason::RateLimitExceeded, &LimitScope::Account);
    tracker.parse_from_error("acc2", 429, Some("30"), RATE_BODY, &LimitScope::Account);

    assert!(!tracker.is_rate_limited("acc1", &LimitScope::Account));
    assert_eq!(tracker.cleanup_expired(), 1);
    assert_eq!(tracker.cleanup_expired(), 0);
    assert!(tracker.is_rate_limited("acc2", &LimitScope::Account));
}

#[test]
fn test_set_lockout_until_keying() {
    let tracker = RateLimitTracker::new();
    let until = SystemTime::now() + Duration::from_secs(600);
    tracker.set_lockout_until("acc1", until, RateLimitReason::QuotaExhausted, &model("m1"));

    assert!(tracker.is_rate_limited("acc1", &model("m1")));
    assert!(!tracker.is_rate_limited("acc1", &LimitScope::Account));
    assert_eq!(tracker.failure_count("acc1"), 0);

    tracker.set_lockout_until("acc2", until, RateLimitReason::RateLimitExceeded, &model("m1"));
    assert!(tracker.is_rate_limited("acc2", &model("other")));
}

#[test]
fn test_set_lockout_until_iso() {
    let tracker = RateLimitTracker::new();
    let future = (chrono::Utc::now() + chrono::Duration::seconds(300)).to_rfc3339();
    assert!(tracker.set_lockout_until_iso(
        "acc1",
        &future,
        RateLimitReason::QuotaExhausted,
        &LimitScope::Account
    ));
    let wait = tracker.get_remaining_wait_secs("acc1", &LimitScope::Account);
    assert!(wait > 295 && wait <= 300);

    assert!(!tracker.set_lockout_until_iso(
        "acc2",
        "not-a-date",
        RateLimitReason::QuotaExhausted,
        &LimitScope::Account
    ));
    assert!(!tracker.set_lockout_until_iso(
        "acc2",
        "1960-01-01T00:00:00Z",
        RateLimitReason::QuotaExhausted,
        &LimitScope::Account
    ));
    assert!(!tracker.is_rate_limited("acc2", &LimitScope::Account));
}

#[test]
fn test_get_and_active_lockouts() {
    let tracker = RateLimitTracker::new();
    tracker.parse_from_error("acc1", 429, Some("30"), RATE_BODY, &LimitScope::Account);
    tracker.parse_from_error("acc1", 429, Some("90"), QUOTA_BODY, &model("m1"));

    let info = tracker.get("acc1", &model("m1")).expect("model entry");
    assert_eq!(info.reason, RateLimitReason::QuotaExhausted);
    assert!(tracker.get("acc1", &model("m2")).is_none());

    let active = tracker.active_lockouts();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].key, "acc1:m1");
    assert_eq!(active[0].model.as_deref(), Some("m1"));
    assert_eq!(active[1].key, "acc1");
    assert!(active[1].model.is_none());
}

#[test]
fn test_clear_all_keeps_counters() {
    let tracker = RateLimitTracker::new();
    tracker.parse_from_error("acc1", 429, None, QUOTA_BODY, &model("m"));
    tracker.clear_all();
    assert!(!tracker.is_rate_limited("acc1", &model("m")));
    assert_eq!(tracker.failure_count("acc1"), 1);
}

#[test]
fn test_trait_object_dispatch() {
    let limiter: Arc<dyn RateLimiter> = Arc::new(RateLimitTracker::new());
    limiter.parse_from_error("acc1", 429, Some("10"), RATE_BODY, &LimitScope::Account);
    assert!(limiter.is_rate_limited("acc1", &LimitScope::Account));
    limiter.mark_success("acc1");
    assert!(!limiter.is_rate_limited("acc1", &LimitScope::Account));
}
