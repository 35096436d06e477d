use super::*;
use std::collections::HashMap;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.herald.name, "Herald");
    assert_eq!(cfg.store.db_path, "~/.herald/data/herald.db");
    assert_eq!(cfg.api.port, 3000);
    assert!(cfg.api.api_key.is_empty());
    assert!(cfg.webhook.campaign_endpoint.is_empty());
    assert_eq!(cfg.webhook.timeout_secs, 30);
    assert!(cfg.outbox.enabled);
    assert_eq!(cfg.outbox.max_attempts, 5);
    assert!(cfg.import.default_country_code.is_empty());
}

#[test]
fn test_partial_sections_from_toml() {
    let toml_str = r#"
        [api]
        port = 8080

        [webhook]
        campaign_endpoint = "https://n8n.local/webhook/campaign"

        [outbox]
        enabled = false
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.api.port, 8080);
    assert_eq!(cfg.api.host, "127.0.0.1");
    assert_eq!(
        cfg.webhook.campaign_endpoint,
        "https://n8n.local/webhook/campaign"
    );
    assert!(!cfg.outbox.enabled);
    assert_eq!(cfg.outbox.poll_interval_secs, 60);
}

#[test]
fn test_env_overrides_file_values() {
    let mut cfg = Config::default();
    cfg.webhook.campaign_endpoint = "https://from-file".to_string();

    let env: HashMap<&str, &str> = HashMap::from([
        ("WEBHOOK_ENDPOINT", "https://from-env"),
        ("NEXT_PUBLIC_WEBHOOK_URL", "https://catalog"),
        ("HERALD_API_KEY", "secret"),
    ]);
    cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

    assert_eq!(cfg.webhook.campaign_endpoint, "https://from-env");
    assert_eq!(cfg.webhook.template_catalog_url, "https://catalog");
    assert_eq!(cfg.api.api_key, "secret");
    assert!(cfg.webhook.single_message_endpoint.is_empty());
}

#[test]
fn test_env_catalog_prefers_explicit_variable() {
    let mut cfg = Config::default();
    let env: HashMap<&str, &str> = HashMap::from([
        ("TEMPLATE_CATALOG_URL", "https://explicit"),
        ("NEXT_PUBLIC_WEBHOOK_URL", "https://fallback"),
    ]);
    cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.webhook.template_catalog_url, "https://explicit");
}

#[test]
fn test_blank_env_value_is_ignored() {
    let mut cfg = Config::default();
    cfg.api.api_key = "keep".to_string();
    cfg.apply_env(|k| (k == "HERALD_API_KEY").then(|| "  ".to_string()));
    assert_eq!(cfg.api.api_key, "keep");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/herald/config.toml").unwrap();
    assert_eq!(cfg.api.port, 3000);
}

#[test]
fn test_load_invalid_toml_is_config_error() {
    let dir = std::env::temp_dir().join("__herald_test_bad_config__");
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join("config.toml");
    std::fs::write(&path, "[api\nport = ").unwrap();

    let err = load(path.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().starts_with("config error: failed to parse config"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_shellexpand_leaves_absolute_paths() {
    assert_eq!(shellexpand("/var/lib/herald.db"), "/var/lib/herald.db");
}

#[test]
fn test_in_memory_store_config() {
    let sc = StoreConfig::in_memory();
    assert!(sc.is_in_memory());
    assert_eq!(sc.max_connections, 1);
    assert!(!StoreConfig::default().is_in_memory());
}
