use thiserror::Error;

/// Failure of a single quota fetch. Only `Network` is retried.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// Caller cancelled the fetch (during the request or the retry wait).
    #[error("quota fetch cancelled")]
    Cancelled,

    /// Transport failure after exhausting every attempt.
    #[error("network error after {attempts} attempt(s): {source}")]
    Network {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered 429. Never cached.
    #[error("{provider} quota endpoint rate limited for account {account_id}")]
    RateLimited { provider: &'static str, account_id: String },

    /// Any other non-success status.
    #[error("{provider} quota request for account {account_id} failed with status {status}: {body}")]
    Status { provider: &'static str, account_id: String, status: u16, body: String },

    /// Well-formed JSON missing a required field.
    #[error("{provider} quota response invalid: {message}")]
    InvalidResponse { provider: &'static str, message: String },

    #[error("{provider} quota response parse error: {source}")]
    Parse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the response body failed.
    #[error("failed to read quota response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl QuotaError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QuotaError::Cancelled)
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, QuotaError::RateLimited { .. })
    }

    /// Upstream status carried by the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuotaError::RateLimited { .. } => Some(429),
            QuotaError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
