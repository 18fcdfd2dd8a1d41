use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use quotarelay_types::{ClaudeQuotaData, ClaudeUsageWindow};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::{read_body, send_with_retry, FetchRetryPolicy, QuotaChecker, QuotaError};

pub const CLAUDE_PROVIDER: &str = "claude";
pub const CLAUDE_OAUTH_BETA: &str = "oauth-2025-04-20";

const DEFAULT_USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default, Deserialize)]
struct UsagePayload {
    #[serde(default)]
    five_hour: Option<WindowPayload>,
    #[serde(default)]
    seven_day: Option<WindowPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct WindowPayload {
    #[serde(default)]
    utilization: Option<f64>,
    #[serde(default)]
    resets_at: Option<String>,
}

impl WindowPayload {
    fn into_window(self) -> ClaudeUsageWindow {
        ClaudeUsageWindow {
            utilization: self.utilization.unwrap_or(0.0),
            resets_at: parse_rfc3339_or_epoch(self.resets_at.as_deref()),
        }
    }
}

fn parse_rfc3339_or_epoch(value: Option<&str>) -> DateTime<Utc> {
    value
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc))
}

/// Missing numbers become 0, missing timestamps the Unix epoch.
fn parse_usage(body: &str) -> Result<ClaudeQuotaData, QuotaError> {
    let payload: UsagePayload = if body.trim().is_empty() {
        UsagePayload::default()
    } else {
        serde_json::from_str(body)
            .map_err(|source| QuotaError::Parse { provider: CLAUDE_PROVIDER, source })?
    };

    Ok(ClaudeQuotaData {
        five_hour: payload.five_hour.unwrap_or_default().into_window(),
        seven_day: payload.seven_day.unwrap_or_default().into_window(),
        last_updated: Utc::now(),
    })
}

#[derive(Debug, Clone, Copy)]
struct CachedUsage {
    data: ClaudeQuotaData,
    fetched_at: Instant,
}

/// Quota checker for the Anthropic OAuth usage endpoint, with a freshness TTL.
pub struct ClaudeQuotaChecker {
    client: reqwest::Client,
    usage_url: String,
    ttl: Duration,
    cache: DashMap<String, CachedUsage>,
}

impl ClaudeQuotaChecker {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_usage_url(client, DEFAULT_USAGE_URL)
    }

    pub fn with_usage_url(client: reqwest::Client, usage_url: impl Into<String>) -> Self {
        Self { client, usage_url: usage_url.into(), ttl: DEFAULT_TTL, cache: DashMap::new() }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn fresh(&self, account_id: &str) -> Option<ClaudeQuotaData> {
        let entry = self.cache.get(account_id)?;
        (entry.fetched_at.elapsed() < self.ttl).then_some(entry.data)
    }
}

#[async_trait]
impl QuotaChecker for ClaudeQuotaChecker {
    type Quota = ClaudeQuotaData;

    fn provider(&self) -> &'static str {
        CLAUDE_PROVIDER
    }

    /// `email` is not used by this provider.
    async fn fetch_quota(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        _email: Option<&str>,
        account_id: &str,
    ) -> Result<ClaudeQuotaData, QuotaError> {
        if let Some(data) = self.fresh(account_id) {
            tracing::debug!(account_id, "claude quota cache hit");
            return Ok(data);
        }

        let response =
            send_with_retry(cancel, FetchRetryPolicy::single(), CLAUDE_PROVIDER, account_id, || {
                self.client
                    .get(&self.usage_url)
                    .bearer_auth(access_token)
                    .header("anthropic-beta", CLAUDE_OAUTH_BETA)
            })
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QuotaError::RateLimited {
                provider: CLAUDE_PROVIDER,
                account_id: account_id.to_string(),
            });
        }

        if status != StatusCode::OK {
            let body = read_body(cancel, response).await.unwrap_or_default();
            return Err(QuotaError::Status {
                provider: CLAUDE_PROVIDER,
                account_id: account_id.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = read_body(cancel, response).await?;
        let data = parse_usage(&body)?;
        self.store_quota(account_id, data);
        Ok(data)
    }

    fn cached_quota(&self, account_id: &str) -> Option<ClaudeQuotaData> {
        self.cache.get(account_id).map(|entry| entry.data)
    }

    fn store_quota(&self, account_id: &str, quota: ClaudeQuotaData) {
        self.cache
            .insert(account_id.to_string(), CachedUsage { data: quota, fetched_at: Instant::now() });
    }
}
