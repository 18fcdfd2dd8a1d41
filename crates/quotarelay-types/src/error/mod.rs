//! Typed error definitions for QuotaRelay.
//!
//! Errors here are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants

mod config;

pub use config::ConfigError;

/// Standard Result type for configuration handling.
pub type Result<T> = std::result::Result<T, ConfigError>;
