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
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset, matching how `.env` templates ship.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("HIMALAYA_ENV", "development"));

    let bind_addr: SocketAddr = parse_as(
        "HIMALAYA_BIND_ADDR",
        &or_default("HIMALAYA_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("HIMALAYA_LOG_LEVEL", "info");

    let airtable_base_id = optional("AIRTABLE_BASE_ID");
    let airtable_api_token = optional("AIRTABLE_API_TOKEN");
    let airtable_table_name = or_default("AIRTABLE_TABLE_NAME", "Locations");
    let airtable_base_url = or_default("AIRTABLE_BASE_URL", "https://api.airtable.com/v0/");

    let fetch_timeout_secs: u64 = parse_as(
        "HIMALAYA_FETCH_TIMEOUT_SECS",
        &or_default("HIMALAYA_FETCH_TIMEOUT_SECS", "5"),
    )?;
    if fetch_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HIMALAYA_FETCH_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let fetch_max_retries: u32 = parse_as(
        "HIMALAYA_FETCH_MAX_RETRIES",
        &or_default("HIMALAYA_FETCH_MAX_RETRIES", "1"),
    )?;
    let fetch_retry_backoff_ms: u64 = parse_as(
        "HIMALAYA_FETCH_RETRY_BACKOFF_MS",
        &or_default("HIMALAYA_FETCH_RETRY_BACKOFF_MS", "250"),
    )?;

    let fallback_path = optional("HIMALAYA_FALLBACK_PATH").map(PathBuf::from);

    let rate_limit_per_minute: usize = parse_as(
        "HIMALAYA_RATE_LIMIT_PER_MINUTE",
        &or_default("HIMALAYA_RATE_LIMIT_PER_MINUTE", "120"),
    )?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        airtable_base_id,
        airtable_api_token,
        airtable_table_name,
        airtable_base_url,
        fetch_timeout_secs,
        fetch_max_retries,
        fetch_retry_backoff_ms,
        fallback_path,
        rate_limit_per_minute,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
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
