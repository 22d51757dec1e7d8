use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("ADFORGE_ENV", "development"));
    let log_level = or_default("ADFORGE_LOG_LEVEL", "info");
    let policy_path = lookup("ADFORGE_POLICY_PATH").ok().map(PathBuf::from);
    let backends_path = PathBuf::from(or_default(
        "ADFORGE_BACKENDS_PATH",
        "./config/backends.yaml",
    ));

    let max_concurrent_variations = parse_usize("ADFORGE_MAX_CONCURRENT_VARIATIONS", "4")?;
    if max_concurrent_variations == 0 {
        return Err(invalid(
            "ADFORGE_MAX_CONCURRENT_VARIATIONS",
            "must be at least 1".to_string(),
        ));
    }
    let variation_timeout_secs = parse_u64("ADFORGE_VARIATION_TIMEOUT_SECS", "300")?;
    if variation_timeout_secs == 0 {
        return Err(invalid(
            "ADFORGE_VARIATION_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }
    let render_request_timeout_secs = parse_u64("ADFORGE_RENDER_REQUEST_TIMEOUT_SECS", "120")?;
    let render_max_retries = parse_u32("ADFORGE_RENDER_MAX_RETRIES", "2")?;
    let render_retry_backoff_base_ms = parse_u64("ADFORGE_RENDER_RETRY_BACKOFF_BASE_MS", "500")?;
    let user_agent = or_default("ADFORGE_USER_AGENT", "adforge/0.1 (render-client)");
    let render_api_key = lookup("ADFORGE_RENDER_API_KEY").ok();

    Ok(AppConfig {
        env,
        log_level,
        policy_path,
        backends_path,
        max_concurrent_variations,
        variation_timeout_secs,
        render_request_timeout_secs,
        render_max_retries,
        render_retry_backoff_base_ms,
        user_agent,
        render_api_key,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
