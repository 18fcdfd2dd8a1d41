//! HTTP client construction with optional upstream proxy.

use quotarelay_types::UpstreamProxyConfig;
use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::error::{AppError, AppResult};

fn redact_proxy_url(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| {
            let host = u.host_str().unwrap_or("?");
            let port = u.port_or_known_default().unwrap_or(0);
            if u.username().is_empty() && u.password().is_none() {
                format!("{}://{}:{}", u.scheme(), host, port)
            } else {
                format!("{}://***@{}:{}", u.scheme(), host, port)
            }
        })
        .unwrap_or_else(|_| "<invalid-url>".to_string())
}

/// Shared builder with keepalive settings.
fn base_builder(timeout_secs: u64) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .tcp_nodelay(true)
        .http2_keep_alive_interval(Duration::from_secs(25))
        .http2_keep_alive_timeout(Duration::from_secs(10))
        .http2_keep_alive_while_idle(true)
}

/// Client shared by the quota checkers.
///
/// An enabled proxy with an empty or invalid URL is an error; the client
/// never silently falls back to a direct connection.
pub fn create_client(timeout_secs: u64, proxy: Option<&UpstreamProxyConfig>) -> AppResult<Client> {
    let mut builder = base_builder(timeout_secs);

    if let Some(config) = proxy.filter(|p| p.enabled) {
        if config.url.trim().is_empty() {
            return Err(AppError::Config(
                "proxy enabled but URL is empty, refusing direct connection".to_string(),
            ));
        }
        let proxy = Proxy::all(config.url.trim())
            .map_err(|e| AppError::Config(format!("invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
        tracing::info!(proxy = %redact_proxy_url(&config.url), "HTTP client: upstream proxy enabled");
    }

    Ok(builder.build()?)
}
