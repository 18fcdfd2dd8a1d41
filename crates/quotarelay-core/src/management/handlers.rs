use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use quotarelay_types::{ClaudeUsageWindow, ModelQuota};
use serde::{Deserialize, Serialize};

use super::ManagementState;
use crate::quota::{QuotaChecker, ANTIGRAVITY_PROVIDER, CLAUDE_PROVIDER};
use crate::rate_limit::LockoutSnapshot;

#[derive(Debug, Serialize)]
pub struct ModelQuotaEntry {
    pub name: String,
    pub display_name: String,
    pub remaining_fraction: f64,
    pub remaining_percent: f64,
    pub reset_time: Option<DateTime<Utc>>,
}

impl From<&ModelQuota> for ModelQuotaEntry {
    fn from(m: &ModelQuota) -> Self {
        Self {
            name: m.name.clone(),
            display_name: m.display_name.clone(),
            remaining_fraction: m.remaining_fraction,
            remaining_percent: m.remaining_percent(),
            reset_time: m.reset_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AntigravityQuotaEntry {
    pub account_id: String,
    pub email: String,
    pub is_forbidden: bool,
    pub models: Vec<ModelQuotaEntry>,
}

#[derive(Debug, Serialize)]
pub struct UsageWindowEntry {
    pub utilization: f64,
    pub remaining_percent: f64,
    pub resets_at: DateTime<Utc>,
}

impl From<&ClaudeUsageWindow> for UsageWindowEntry {
    fn from(w: &ClaudeUsageWindow) -> Self {
        Self {
            utilization: w.utilization,
            remaining_percent: w.remaining_percent(),
            resets_at: w.resets_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaudeQuotaEntry {
    pub account_id: String,
    pub email: String,
    pub five_hour: UsageWindowEntry,
    pub seven_day: UsageWindowEntry,
}

/// GET /v0/management/antigravity-quota
pub async fn get_antigravity_quota(
    State(state): State<ManagementState>,
) -> Json<Vec<AntigravityQuotaEntry>> {
    let cancel = state.shutdown.child_token();
    let mut results = Vec::new();

    for account in state.registry.by_provider(ANTIGRAVITY_PROVIDER) {
        let email = account.email.as_deref();
        let Some(quota) = state
            .antigravity
            .fetch_or_cached(&cancel, &account.access_token, email, &account.id)
            .await
        else {
            continue;
        };

        results.push(AntigravityQuotaEntry {
            account_id: account.id.clone(),
            email: email.unwrap_or_default().to_string(),
            is_forbidden: quota.is_forbidden,
            models: quota.models.iter().map(ModelQuotaEntry::from).collect(),
        });
    }

    Json(results)
}

/// GET /v0/management/claude-quota
pub async fn get_claude_quota(State(state): State<ManagementState>) -> Json<Vec<ClaudeQuotaEntry>> {
    let cancel = state.shutdown.child_token();
    let mut results = Vec::new();

    for account in state.registry.by_provider(CLAUDE_PROVIDER) {
        let Some(quota) = state
            .claude
            .fetch_or_cached(&cancel, &account.access_token, None, &account.id)
            .await
        else {
            continue;
        };

        results.push(ClaudeQuotaEntry {
            account_id: account.id.clone(),
            email: account.email.clone().unwrap_or_default(),
            five_hour: UsageWindowEntry::from(&quota.five_hour),
            seven_day: UsageWindowEntry::from(&quota.seven_day),
        });
    }

    Json(results)
}

/// GET /v0/management/rate-limits
pub async fn get_rate_limits(State(state): State<ManagementState>) -> Json<Vec<LockoutSnapshot>> {
    Json(state.ledger.active_lockouts())
}

#[derive(Debug, Deserialize)]
pub struct ThresholdCheckQuery {
    pub account_id: String,
    pub model: String,
}

/// GET /v0/management/threshold-check?account_id=..&model=..
///
/// 204 when the account may take the request, otherwise the 429 quota
/// threshold rejection. Reads cached quota only; unknown accounts are 404.
pub async fn check_threshold(
    State(state): State<ManagementState>,
    Query(query): Query<ThresholdCheckQuery>,
) -> Response {
    let Some(account) = state.registry.list().into_iter().find(|a| a.id == query.account_id)
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let guards = &state.thresholds;
    let verdict = match account.provider.as_str() {
        CLAUDE_PROVIDER => guards.claude.as_ref().map_or(Ok(()), |guard| {
            guard.check_cached_claude(&state.claude, &account.id, &query.model)
        }),
        ANTIGRAVITY_PROVIDER => guards.antigravity.as_ref().map_or(Ok(()), |guard| {
            guard.check_cached_model(&state.antigravity, &account.id, &query.model)
        }),
        _ => Ok(()),
    };

    match verdict {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
