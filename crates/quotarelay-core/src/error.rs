//! Unified error types for QuotaRelay Core.

use serde::Serialize;
use thiserror::Error;

/// Main error type for core operations outside the infallible ledger.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<quotarelay_types::ConfigError> for AppError {
    fn from(e: quotarelay_types::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::Config("bad threshold".to_string());
        let json = serde_json::to_string(&err).expect("serialize");
        assert_eq!(json, "\"Configuration error: bad threshold\"");
    }

    #[test]
    fn test_json_error_converts() {
        let err: AppError =
            serde_json::from_str::<u32>("nope").map_err(AppError::from).expect_err("invalid");
        assert!(matches!(err, AppError::Json(_)));
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
