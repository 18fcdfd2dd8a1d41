use quotarelay_types::{LimitScope, RateLimitReason};

/// Ledger key: `account` or `account:model`.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum RateLimitKey {
    Account(String),
    Model { account: String, model: String },
}

impl RateLimitKey {
    pub fn account(account_id: &str) -> Self {
        RateLimitKey::Account(account_id.to_string())
    }

    pub fn model(account_id: &str, model: &str) -> Self {
        RateLimitKey::Model { account: account_id.to_string(), model: model.to_string() }
    }

    /// Key a lookup exactly as the scope says.
    pub fn from_scope(account_id: &str, scope: &LimitScope) -> Self {
        match scope.model_name() {
            Some(m) => RateLimitKey::model(account_id, m),
            None => RateLimitKey::account(account_id),
        }
    }

    /// Key a new lockout: only QUOTA_EXHAUSTED with a model is model-scoped,
    /// every other reason locks the whole account.
    pub fn for_lockout(account_id: &str, reason: RateLimitReason, scope: &LimitScope) -> Self {
        match (reason, scope.model_name()) {
            (RateLimitReason::QuotaExhausted, Some(m)) => RateLimitKey::model(account_id, m),
            _ => RateLimitKey::account(account_id),
        }
    }

    pub fn account_id(&self) -> &str {
        match self {
            RateLimitKey::Account(acc) => acc,
            RateLimitKey::Model { account, .. } => account,
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            RateLimitKey::Account(_) => None,
            RateLimitKey::Model { model, .. } => Some(model),
        }
    }

    pub fn scope(&self) -> LimitScope {
        LimitScope::from_model(self.model_name())
    }
}

impl std::fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitKey::Account(acc) => write!(f, "{}", acc),
            RateLimitKey::Model { account, model } => write!(f, "{}:{}", account, model),
        }
    }
}
