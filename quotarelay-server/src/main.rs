//! QuotaRelay Server - Headless Daemon
//!
//! Loads the resilience config and the account list, constructs the backoff
//! ledger and one quota checker per provider, and serves:
//!
//! - `GET /v0/management/antigravity-quota`
//! - `GET /v0/management/claude-quota`
//! - `GET /v0/management/rate-limits`
//! - `GET /v0/management/threshold-check?account_id=..&model=..`
//! - `GET /healthz`

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

mod cli;
mod server_utils;
mod state;
mod sweep;

use cli::Cli;
use quotarelay_core::management::{router, ManagementState};
use quotarelay_core::modules::{config, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(&cli.log_level);

    let resilience = match cli.config_path() {
        Some(path) => config::load_config(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            tracing::warn!("home directory unknown, using default config");
            quotarelay_types::ResilienceConfig::default()
        },
    };

    let shutdown = CancellationToken::new();
    let state = state::build_state(&resilience, cli.accounts.as_deref(), shutdown.clone())?;

    let sweep = sweep::spawn_lockout_sweep(
        Arc::clone(&state.ledger),
        Duration::from_secs(resilience.backoff.cleanup_interval_secs),
        shutdown.clone(),
    );

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cli.host, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("QuotaRelay listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(server_utils::shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweep {
        let _ = handle.await;
    }
    info!("QuotaRelay stopped");
    Ok(())
}

fn build_router(state: ManagementState) -> Router {
    router(state)
        .route("/healthz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
}
