//! Per-provider quota checkers.
//!
//! Each checker fetches upstream quota, caches the last good result per
//! account and serves cached reads regardless of later fetch failures.

mod antigravity;
mod claude;
mod error;

pub use antigravity::{AntigravityQuotaChecker, ANTIGRAVITY_PROVIDER};
pub use claude::{ClaudeQuotaChecker, CLAUDE_OAUTH_BETA, CLAUDE_PROVIDER};
pub use error::QuotaError;

use async_trait::async_trait;
use quotarelay_types::QuotaFetchConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fetch, cache and read back one provider's quota.
#[async_trait]
pub trait QuotaChecker: Send + Sync {
    type Quota: Clone + Send + Sync + 'static;

    fn provider(&self) -> &'static str;

    async fn fetch_quota(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        email: Option<&str>,
        account_id: &str,
    ) -> Result<Self::Quota, QuotaError>;

    fn cached_quota(&self, account_id: &str) -> Option<Self::Quota>;

    /// Replace the cached entry wholesale.
    fn store_quota(&self, account_id: &str, quota: Self::Quota);

    /// Live fetch, falling back to the last cached value on any error.
    async fn fetch_or_cached(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        email: Option<&str>,
        account_id: &str,
    ) -> Option<Self::Quota> {
        match self.fetch_quota(cancel, access_token, email, account_id).await {
            Ok(quota) => Some(quota),
            Err(e) => {
                tracing::warn!(
                    provider = self.provider(),
                    account_id,
                    error = %e,
                    "quota fetch failed, using cached value"
                );
                self.cached_quota(account_id)
            },
        }
    }
}

/// Bounded retry for transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl FetchRetryPolicy {
    pub fn single() -> Self {
        Self { max_attempts: 1, delay: Duration::ZERO }
    }

    pub fn from_config(config: &QuotaFetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Default for FetchRetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(1) }
    }
}

/// Send the request built by `build`, retrying transport errors only.
/// Cancellation aborts both the request and the inter-attempt wait.
pub(crate) async fn send_with_retry<F>(
    cancel: &CancellationToken,
    retry: FetchRetryPolicy,
    provider: &'static str,
    account_id: &str,
    build: F,
) -> Result<reqwest::Response, QuotaError>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(QuotaError::Cancelled),
            res = build().send() => res,
        };

        match result {
            Ok(response) => return Ok(response),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    provider,
                    account_id,
                    attempt,
                    max_attempts,
                    error = %e,
                    "quota request failed, retrying"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(QuotaError::Cancelled),
                    () = tokio::time::sleep(retry.delay) => {},
                }
            },
            Err(e) => return Err(QuotaError::Network { attempts: attempt, source: e }),
        }
    }
}

/// Read the full body, racing cancellation.
pub(crate) async fn read_body(
    cancel: &CancellationToken,
    response: reqwest::Response,
) -> Result<String, QuotaError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(QuotaError::Cancelled),
        text = response.text() => text.map_err(QuotaError::Body),
    }
}
