use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::{AppError, AppResult};
use quotarelay_types::{ConfigError, ResilienceConfig};

const CONFIG_DIR: &str = ".quotarelay";
const CONFIG_FILE: &str = "config.json";

/// `~/.quotarelay/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load and validate the resilience config. A missing file yields defaults.
pub fn load_config(path: &Path) -> AppResult<ResilienceConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        return Ok(ResilienceConfig::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(path, &e))?;
    let config: ResilienceConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?;

    validate_config(&config)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Field constraints plus URL checks the derive cannot express.
pub fn validate_config(config: &ResilienceConfig) -> AppResult<()> {
    config.validate().map_err(|e| ConfigError::from_validation(&e))?;

    let urls = [
        ("quota.antigravity_base_url", config.quota.antigravity_base_url.as_str()),
        ("quota.claude_usage_url", config.quota.claude_usage_url.as_str()),
    ];
    for (field, value) in urls {
        url::Url::parse(value).map_err(|e| ConfigError::ValidationError {
            field: field.to_string(),
            message: e.to_string(),
        })?;
    }

    let proxy = &config.quota.upstream_proxy;
    if proxy.enabled && url::Url::parse(&proxy.url).is_err() {
        return Err(AppError::Config(
            "quota.upstream_proxy.url must be a valid URL when the proxy is enabled".to_string(),
        ));
    }
    Ok(())
}
