#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test, panics are the assertion mechanism")]

use axum_test::TestServer;
use quotarelay_core::management::{router, AccountRecord, ManagementState, StaticAccountRegistry};
use quotarelay_core::quota::{AntigravityQuotaChecker, ClaudeQuotaChecker, QuotaChecker};
use quotarelay_core::rate_limit::RateLimitTracker;
use quotarelay_core::threshold::ThresholdGuards;
use quotarelay_types::{
    ClaudeQuotaData, ClaudeUsageWindow, LimitScope, ModelQuota, QuotaData, ThresholdConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account(id: &str, provider: &str, token: &str, email: Option<&str>) -> AccountRecord {
    AccountRecord {
        id: id.to_string(),
        provider: provider.to_string(),
        access_token: token.to_string(),
        email: email.map(str::to_string),
    }
}

struct Harness {
    state: ManagementState,
}

impl Harness {
    fn new(upstream: &MockServer, accounts: Vec<AccountRecord>) -> Self {
        let client = reqwest::Client::new();
        let state = ManagementState {
            registry: Arc::new(StaticAccountRegistry::new(accounts)),
            antigravity: Arc::new(AntigravityQuotaChecker::with_base_url(
                client.clone(),
                upstream.uri(),
            )),
            claude: Arc::new(ClaudeQuotaChecker::with_usage_url(
                client,
                format!("{}/api/oauth/usage", upstream.uri()),
            )),
            ledger: Arc::new(RateLimitTracker::new()),
            thresholds: ThresholdGuards::default(),
            shutdown: CancellationToken::new(),
        };
        Self { state }
    }

    fn with_threshold(mut self, utilization_percent: f64) -> Self {
        self.state.thresholds =
            ThresholdGuards::from_config(&ThresholdConfig { enabled: true, utilization_percent });
        self
    }

    fn server(&self) -> TestServer {
        TestServer::new(router(self.state.clone())).expect("test server")
    }
}

#[tokio::test]
async fn test_no_accounts_returns_empty_arrays() {
    let upstream = MockServer::start().await;
    let harness = Harness::new(&upstream, Vec::new());
    let server = harness.server();

    for route in [
        "/v0/management/antigravity-quota",
        "/v0/management/claude-quota",
        "/v0/management/rate-limits",
    ] {
        let response = server.get(route).await;
        response.assert_status_ok();
        let json: serde_json::Value = response.json();
        assert_eq!(json, serde_json::json!([]), "route: {}", route);
    }
}

#[tokio::test]
async fn test_antigravity_quota_live_fetch() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1internal:fetchAvailableModels"))
        .and(header("authorization", "Bearer ag-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": {
                "gemini-2.5-pro": {
                    "displayName": "Gemini 2.5 Pro",
                    "quotaInfo": {"remainingFraction": 0.25}
                }
            }
        })))
        .mount(&upstream)
        .await;

    let harness = Harness::new(
        &upstream,
        vec![
            account("ag1", "antigravity", "ag-token", Some("ag@example.com")),
            account("c1", "claude", "c-token", None),
        ],
    );
    let response = harness.server().get("/v0/management/antigravity-quota").await;
    response.assert_status_ok();

    let json: serde_json::Value = response.json();
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["account_id"], "ag1");
    assert_eq!(entries[0]["email"], "ag@example.com");
    assert_eq!(entries[0]["models"][0]["name"], "gemini-2.5-pro");
    assert_eq!(entries[0]["models"][0]["display_name"], "Gemini 2.5 Pro");
    assert_eq!(entries[0]["models"][0]["remaining_percent"], 25.0);
}

#[tokio::test]
async fn test_antigravity_quota_falls_back_to_cache() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1internal:fetchAvailableModels"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&upstream)
        .await;

    let harness = Harness::new(
        &upstream,
        vec![
            account("cached", "antigravity", "t1", None),
            account("uncached", "antigravity", "t2", None),
        ],
    );
    let mut quota = QuotaData::new();
    quota.add_model(ModelQuota::new("claude-opus-4", 0.5));
    harness.state.antigravity.store_quota("cached", quota);

    let json: serde_json::Value =
        harness.server().get("/v0/management/antigravity-quota").await.json();
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["account_id"], "cached");
    assert_eq!(entries[0]["email"], "");
    assert_eq!(entries[0]["models"][0]["remaining_fraction"], 0.5);
}

#[tokio::test]
async fn test_claude_quota() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/oauth/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "five_hour": {"utilization": 40.0, "resets_at": "2030-01-01T05:00:00Z"},
            "seven_day": {"utilization": 10.0, "resets_at": "2030-01-07T00:00:00Z"}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let harness = Harness::new(
        &upstream,
        vec![account("c1", "claude", "c-token", Some("c@example.com"))],
    );
    let server = harness.server();

    let json: serde_json::Value = server.get("/v0/management/claude-quota").await.json();
    assert_eq!(json[0]["account_id"], "c1");
    assert_eq!(json[0]["email"], "c@example.com");
    assert_eq!(json[0]["five_hour"]["utilization"], 40.0);
    assert_eq!(json[0]["five_hour"]["remaining_percent"], 60.0);
    assert_eq!(json[0]["seven_day"]["remaining_percent"], 90.0);

    // Within the TTL the second call is served from cache.
    let again: serde_json::Value = server.get("/v0/management/claude-quota").await.json();
    assert_eq!(again, json);
}

#[tokio::test]
async fn test_rate_limits_lists_active_lockouts() {
    let upstream = MockServer::start().await;
    let harness = Harness::new(&upstream, Vec::new());
    harness.state.ledger.parse_from_error(
        "acc1",
        429,
        Some("120"),
        "quota exhausted",
        &LimitScope::model("gemini-2.5-pro"),
    );
    harness.state.ledger.parse_from_error(
        "acc2",
        429,
        Some("30"),
        "rate limit exceeded",
        &LimitScope::Account,
    );

    let json: serde_json::Value = harness.server().get("/v0/management/rate-limits").await.json();
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0]["key"], "acc1:gemini-2.5-pro");
    assert_eq!(entries[0]["model"], "gemini-2.5-pro");
    assert_eq!(entries[0]["reason"], "QUOTA_EXHAUSTED");
    assert_eq!(entries[0]["retry_after_sec"], 120);

    assert_eq!(entries[1]["account_id"], "acc2");
    assert!(entries[1]["model"].is_null());
    assert_eq!(entries[1]["reason"], "RATE_LIMIT_EXCEEDED");
}

fn claude_usage(utilization: f64) -> ClaudeQuotaData {
    let resets_at = chrono::Utc::now() + chrono::Duration::minutes(30);
    ClaudeQuotaData {
        five_hour: ClaudeUsageWindow { utilization, resets_at },
        seven_day: ClaudeUsageWindow { utilization: 10.0, resets_at },
        last_updated: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn test_threshold_check_rejects_claude_over_ceiling() {
    let upstream = MockServer::start().await;
    let harness = Harness::new(&upstream, vec![account("c1", "claude", "t", None)])
        .with_threshold(80.0);
    harness.state.claude.store_quota("c1", claude_usage(92.5));

    let response = harness
        .server()
        .get("/v0/management/threshold-check")
        .add_query_param("account_id", "c1")
        .add_query_param("model", "claude-sonnet-4-5")
        .await;
    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = response
        .header("retry-after")
        .to_str()
        .expect("ascii")
        .parse()
        .expect("seconds");
    assert!(retry_after > 1700 && retry_after <= 1800, "retry-after: {}", retry_after);

    let json: serde_json::Value = response.json();
    assert_eq!(json["error"]["code"], "quota_threshold_exceeded");
    assert_eq!(json["error"]["model"], "claude-sonnet-4-5");
    assert_eq!(json["error"]["provider"], "claude");
    assert_eq!(json["error"]["threshold"], 80.0);
}

#[tokio::test]
async fn test_threshold_check_allows_under_ceiling() {
    let upstream = MockServer::start().await;
    let harness = Harness::new(
        &upstream,
        vec![account("ag1", "antigravity", "t", None), account("c1", "claude", "t", None)],
    )
    .with_threshold(80.0);
    let mut quota = QuotaData::new();
    quota.add_model(ModelQuota::new("gemini-2.5-pro", 0.5));
    harness.state.antigravity.store_quota("ag1", quota);
    let server = harness.server();

    let cases = [("ag1", "gemini-2.5-pro"), ("ag1", "gemini-unknown"), ("c1", "claude-x")];
    for (account_id, model) in cases {
        server
            .get("/v0/management/threshold-check")
            .add_query_param("account_id", account_id)
            .add_query_param("model", model)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_threshold_check_antigravity_and_disabled() {
    let upstream = MockServer::start().await;
    let accounts = vec![account("ag1", "antigravity", "t", None)];
    let mut quota = QuotaData::new();
    quota.add_model(ModelQuota::new("gemini-2.5-pro", 0.05));

    let enabled = Harness::new(&upstream, accounts.clone()).with_threshold(90.0);
    enabled.state.antigravity.store_quota("ag1", quota.clone());
    let response = enabled
        .server()
        .get("/v0/management/threshold-check")
        .add_query_param("account_id", "ag1")
        .add_query_param("model", "gemini-2.5-pro")
        .await;
    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"]["provider"], "antigravity");

    let disabled = Harness::new(&upstream, accounts);
    disabled.state.antigravity.store_quota("ag1", quota);
    let server = disabled.server();
    server
        .get("/v0/management/threshold-check")
        .add_query_param("account_id", "ag1")
        .add_query_param("model", "gemini-2.5-pro")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    server
        .get("/v0/management/threshold-check")
        .add_query_param("account_id", "missing")
        .add_query_param("model", "gemini-2.5-pro")
        .await
        .assert_status_not_found();
}
