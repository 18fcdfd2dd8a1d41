use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wait for Ctrl+C or SIGTERM, then cancel `shutdown` so in-flight quota
/// fetches abort.
#[allow(
    clippy::expect_used,
    reason = "Signal handlers are critical infrastructure, panic is appropriate on failure"
)]
pub async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
        () = shutdown.cancelled() => {},
    }

    shutdown.cancel();
    info!("Graceful shutdown initiated, draining in-flight requests");
}
