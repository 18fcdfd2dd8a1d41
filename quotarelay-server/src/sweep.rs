//! Periodic removal of expired lockouts.

use quotarelay_core::rate_limit::RateLimitTracker;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Spawn the sweep. `period` of zero disables it.
pub fn spawn_lockout_sweep(
    ledger: Arc<RateLimitTracker>,
    period: Duration,
    shutdown: CancellationToken,
) -> Option<tokio::task::JoinHandle<()>> {
    if period.is_zero() {
        tracing::info!("lockout sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = ledger.cleanup_expired();
                    if removed > 0 {
                        tracing::debug!(removed, "lockout sweep");
                    }
                }
            }
        }
        tracing::debug!("lockout sweep stopped");
    }))
}
