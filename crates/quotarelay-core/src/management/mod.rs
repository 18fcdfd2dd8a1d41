//! Read-only management endpoints for quota and lockout status.

mod handlers;
mod registry;

pub use handlers::{
    AntigravityQuotaEntry, ClaudeQuotaEntry, ModelQuotaEntry, ThresholdCheckQuery, UsageWindowEntry,
};
pub use registry::{AccountRecord, AccountRegistry, StaticAccountRegistry};

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::quota::{AntigravityQuotaChecker, ClaudeQuotaChecker};
use crate::rate_limit::RateLimitTracker;
use crate::threshold::ThresholdGuards;

/// Explicitly constructed components shared by the handlers.
#[derive(Clone)]
pub struct ManagementState {
    pub registry: Arc<dyn AccountRegistry>,
    pub antigravity: Arc<AntigravityQuotaChecker>,
    pub claude: Arc<ClaudeQuotaChecker>,
    pub ledger: Arc<RateLimitTracker>,
    /// Pre-flight ceilings; both `None` when the guard is disabled.
    pub thresholds: ThresholdGuards,
    /// Cancelled on shutdown; in-flight quota fetches abort.
    pub shutdown: CancellationToken,
}

pub fn router(state: ManagementState) -> Router {
    Router::new()
        .route("/v0/management/antigravity-quota", get(handlers::get_antigravity_quota))
        .route("/v0/management/claude-quota", get(handlers::get_claude_quota))
        .route("/v0/management/rate-limits", get(handlers::get_rate_limits))
        .route("/v0/management/threshold-check", get(handlers::check_threshold))
        .with_state(state)
}
