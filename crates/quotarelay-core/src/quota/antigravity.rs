use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use quotarelay_types::{ModelQuota, QuotaData};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use super::{read_body, send_with_retry, FetchRetryPolicy, QuotaChecker, QuotaError};

pub const ANTIGRAVITY_PROVIDER: &str = "antigravity";

const DEFAULT_BASE_URL: &str = "https://cloudcode-pa.googleapis.com";
const FETCH_MODELS_PATH: &str = "/v1internal:fetchAvailableModels";
const USER_AGENT: &str = "google-api-nodejs-client/9.15.1 gl-node/22.17.0";

/// Model families worth tracking; everything else is dropped.
const MODEL_PREFIXES: &[&str] = &["gemini", "claude", "gpt", "image", "imagen"];

/// Entries are kept as raw JSON so an odd shape on a filtered-out model
/// cannot fail the whole fetch.
#[derive(Debug, Deserialize)]
struct FetchModelsResponse {
    models: Option<BTreeMap<String, Value>>,
}

/// Quota checker for the Antigravity `fetchAvailableModels` endpoint.
pub struct AntigravityQuotaChecker {
    client: reqwest::Client,
    base_url: String,
    retry: FetchRetryPolicy,
    cache: DashMap<String, QuotaData>,
}

impl AntigravityQuotaChecker {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: FetchRetryPolicy::default(),
            cache: DashMap::new(),
        }
    }

    pub fn with_retry(mut self, retry: FetchRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, FETCH_MODELS_PATH)
    }
}

/// Parse the `models` map, keeping only tracked families.
fn parse_models(body: &str) -> Result<QuotaData, QuotaError> {
    let response: FetchModelsResponse = serde_json::from_str(body)
        .map_err(|source| QuotaError::Parse { provider: ANTIGRAVITY_PROVIDER, source })?;

    let models = response.models.ok_or_else(|| QuotaError::InvalidResponse {
        provider: ANTIGRAVITY_PROVIDER,
        message: "missing models field".to_string(),
    })?;

    let mut data = QuotaData::new();
    for (raw_name, info) in models {
        let name = raw_name.trim();
        if name.is_empty() || !MODEL_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }

        let display_name = info
            .get("displayName")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .unwrap_or(name)
            .to_string();
        let quota_info = info.get("quotaInfo");
        let remaining_fraction = quota_info
            .and_then(|q| q.get("remainingFraction"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let reset_time = quota_info
            .and_then(|q| q.get("resetTime"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        data.add_model(ModelQuota {
            name: name.to_string(),
            display_name,
            remaining_fraction,
            reset_time,
        });
    }

    tracing::debug!(models = data.models.len(), "antigravity quota parsed");
    Ok(data)
}

#[async_trait]
impl QuotaChecker for AntigravityQuotaChecker {
    type Quota = QuotaData;

    fn provider(&self) -> &'static str {
        ANTIGRAVITY_PROVIDER
    }

    async fn fetch_quota(
        &self,
        cancel: &CancellationToken,
        access_token: &str,
        email: Option<&str>,
        account_id: &str,
    ) -> Result<QuotaData, QuotaError> {
        let url = self.endpoint();
        let response = send_with_retry(cancel, self.retry, ANTIGRAVITY_PROVIDER, account_id, || {
            self.client
                .post(&url)
                .bearer_auth(access_token)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::USER_AGENT, USER_AGENT)
                .body("{}")
        })
        .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            tracing::warn!(
                account_id,
                email = email.unwrap_or_default(),
                "account has no permission (403 Forbidden), caching forbidden quota"
            );
            let data = QuotaData::forbidden();
            self.store_quota(account_id, data.clone());
            return Ok(data);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QuotaError::RateLimited {
                provider: ANTIGRAVITY_PROVIDER,
                account_id: account_id.to_string(),
            });
        }

        if !status.is_success() {
            let body = read_body(cancel, response).await.unwrap_or_default();
            return Err(QuotaError::Status {
                provider: ANTIGRAVITY_PROVIDER,
                account_id: account_id.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = read_body(cancel, response).await?;
        let data = parse_models(&body)?;
        self.store_quota(account_id, data.clone());
        Ok(data)
    }

    fn cached_quota(&self, account_id: &str) -> Option<QuotaData> {
        self.cache.get(account_id).map(|entry| entry.value().clone())
    }

    fn store_quota(&self, account_id: &str, quota: QuotaData) {
        self.cache.insert(account_id.to_string(), quota);
    }
}
