use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Credential metadata for one upstream account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub provider: String,
    #[serde(skip_serializing, default)]
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Source of accounts. The core only reads it.
pub trait AccountRegistry: Send + Sync {
    fn list(&self) -> Vec<AccountRecord>;

    fn by_provider(&self, provider: &str) -> Vec<AccountRecord> {
        self.list().into_iter().filter(|a| a.provider == provider).collect()
    }
}

/// Fixed account list, typically loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticAccountRegistry {
    accounts: Vec<AccountRecord>,
}

impl StaticAccountRegistry {
    pub fn new(accounts: Vec<AccountRecord>) -> Self {
        Self { accounts }
    }

    /// Load a JSON array of accounts. A missing file yields an empty registry.
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "accounts file not found, starting with no accounts");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let accounts: Vec<AccountRecord> = serde_json::from_str(&content).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to parse accounts file");
            AppError::Json(e)
        })?;

        tracing::info!(count = accounts.len(), "accounts loaded");
        Ok(Self::new(accounts))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountRegistry for StaticAccountRegistry {
    fn list(&self) -> Vec<AccountRecord> {
        self.accounts.clone()
    }
}
