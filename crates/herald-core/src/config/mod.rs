mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::HeraldError;
use defaults::*;

/// Top-level Herald configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub herald: HeraldConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub outbox: OutboxConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Root for logs. Empty = log to stderr only.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// SQLite store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. `:memory:` opens a private in-memory database.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl StoreConfig {
    /// Config for an ephemeral in-memory database (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for API authentication. Empty = no auth (for local-only use).
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// Outbound automation endpoints. Empty = not configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub campaign_endpoint: String,
    #[serde(default)]
    pub single_message_endpoint: String,
    #[serde(default)]
    pub template_catalog_url: String,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            campaign_endpoint: String::new(),
            single_message_endpoint: String::new(),
            template_catalog_url: String::new(),
            timeout_secs: default_webhook_timeout(),
        }
    }
}

/// Redelivery of failed campaign webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Contact import defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Country code (e.g. "+1") applied to numbers without a leading `+`.
    /// Empty = such numbers are rejected.
    #[serde(default)]
    pub default_country_code: String,
}

impl Config {
    /// Apply environment overrides on top of the file values.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WEBHOOK_ENDPOINT") {
            self.webhook.campaign_endpoint = v;
        }
        if let Some(v) = get("SINGLE_MESSAGE_WEBHOOK_ENDPOINT") {
            self.webhook.single_message_endpoint = v;
        }
        if let Some(v) = get("TEMPLATE_CATALOG_URL").or_else(|| get("NEXT_PUBLIC_WEBHOOK_URL")) {
            self.webhook.template_catalog_url = v;
        }
        if let Some(v) = get("HERALD_API_KEY") {
            self.api.api_key = v;
        }
        if let Some(v) = get("HERALD_DB_PATH") {
            self.store.db_path = v;
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, HeraldError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| HeraldError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| HeraldError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
