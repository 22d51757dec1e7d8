use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(parse_environment("development"), Environment::Development);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_defaults_from_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert!(cfg.ansi_logs());
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.policy_path.is_none());
    assert_eq!(cfg.backends_path.to_string_lossy(), "./config/backends.yaml");
    assert_eq!(cfg.max_concurrent_variations, 4);
    assert_eq!(cfg.variation_timeout_secs, 300);
    assert_eq!(cfg.render_request_timeout_secs, 120);
    assert_eq!(cfg.render_max_retries, 2);
    assert_eq!(cfg.render_retry_backoff_base_ms, 500);
    assert_eq!(cfg.user_agent, "adforge/0.1 (render-client)");
    assert!(cfg.render_api_key.is_none());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("ADFORGE_ENV", "production");
    map.insert("ADFORGE_POLICY_PATH", "/etc/adforge/policy.yaml");
    map.insert("ADFORGE_MAX_CONCURRENT_VARIATIONS", "8");
    map.insert("ADFORGE_VARIATION_TIMEOUT_SECS", "30");
    map.insert("ADFORGE_RENDER_MAX_RETRIES", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert!(!cfg.ansi_logs());
    assert_eq!(
        cfg.policy_path.as_deref().map(|p| p.to_string_lossy().into_owned()),
        Some("/etc/adforge/policy.yaml".to_string())
    );
    assert_eq!(cfg.max_concurrent_variations, 8);
    assert_eq!(cfg.variation_timeout_secs, 30);
    assert_eq!(cfg.render_max_retries, 0);
}

#[test]
fn build_app_config_rejects_non_numeric_concurrency() {
    let mut map = HashMap::new();
    map.insert("ADFORGE_MAX_CONCURRENT_VARIATIONS", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADFORGE_MAX_CONCURRENT_VARIATIONS"),
        "expected InvalidEnvVar(ADFORGE_MAX_CONCURRENT_VARIATIONS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_concurrency() {
    let mut map = HashMap::new();
    map.insert("ADFORGE_MAX_CONCURRENT_VARIATIONS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADFORGE_MAX_CONCURRENT_VARIATIONS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_timeout() {
    let mut map = HashMap::new();
    map.insert("ADFORGE_VARIATION_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADFORGE_VARIATION_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_backoff() {
    let mut map = HashMap::new();
    map.insert("ADFORGE_RENDER_RETRY_BACKOFF_BASE_MS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ADFORGE_RENDER_RETRY_BACKOFF_BASE_MS"),
        "got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_api_key() {
    let mut map = HashMap::new();
    map.insert("ADFORGE_RENDER_API_KEY", "super-secret-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("super-secret-key"));
    assert!(debug.contains("[redacted]"));
}
