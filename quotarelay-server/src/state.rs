//! Startup wiring: one ledger and one checker per provider.

use anyhow::{Context, Result};
use quotarelay_core::management::{ManagementState, StaticAccountRegistry};
use quotarelay_core::quota::{AntigravityQuotaChecker, ClaudeQuotaChecker, FetchRetryPolicy};
use quotarelay_core::rate_limit::{BackoffPolicy, RateLimitTracker};
use quotarelay_core::threshold::ThresholdGuards;
use quotarelay_core::utils::http::create_client;
use quotarelay_types::ResilienceConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn build_state(
    config: &ResilienceConfig,
    accounts_path: Option<&Path>,
    shutdown: CancellationToken,
) -> Result<ManagementState> {
    let fetch = &config.quota;
    let client = create_client(fetch.request_timeout_secs, Some(&fetch.upstream_proxy))
        .context("failed to build HTTP client")?;

    let registry = match accounts_path {
        Some(path) => StaticAccountRegistry::from_json_file(path)
            .with_context(|| format!("failed to load accounts from {}", path.display()))?,
        None => StaticAccountRegistry::default(),
    };
    tracing::info!(accounts = registry.len(), "account registry ready");

    let antigravity =
        AntigravityQuotaChecker::with_base_url(client.clone(), fetch.antigravity_base_url.clone())
            .with_retry(FetchRetryPolicy::from_config(fetch));
    let claude = ClaudeQuotaChecker::with_usage_url(client, fetch.claude_usage_url.clone())
        .with_ttl(Duration::from_secs(fetch.claude_cache_ttl_secs));
    let ledger = RateLimitTracker::with_policy(BackoffPolicy::from_config(&config.backoff));
    let thresholds = ThresholdGuards::from_config(&config.threshold);
    tracing::info!(
        enabled = thresholds.is_enabled(),
        utilization_percent = config.threshold.utilization_percent,
        "quota threshold guard configured"
    );

    Ok(ManagementState {
        registry: Arc::new(registry),
        antigravity: Arc::new(antigravity),
        claude: Arc::new(claude),
        ledger: Arc::new(ledger),
        thresholds,
        shutdown,
    })
}
