use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function, so parsing can be tested against a plain `HashMap` without
/// touching the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let provider_base_url = require("METROAQ_PROVIDER_BASE_URL")?;

    let env = parse_environment(&or_default("METROAQ_ENV", "development"));
    let log_level = or_default("METROAQ_LOG_LEVEL", "info");

    let provider_request_timeout_secs = parse_u64("METROAQ_PROVIDER_REQUEST_TIMEOUT_SECS", "30")?;
    let provider_user_agent = or_default("METROAQ_PROVIDER_USER_AGENT", "metroaq/0.1 (aqi-map)");

    let recompute_primary_url = lookup("METROAQ_RECOMPUTE_PRIMARY_URL").ok();
    let recompute_token = lookup("METROAQ_RECOMPUTE_TOKEN").ok();
    let recompute_secondary_timeout_secs =
        parse_u64("METROAQ_RECOMPUTE_SECONDARY_TIMEOUT_SECS", "10")?;
    let recompute_refetch_delay_secs = parse_u64("METROAQ_RECOMPUTE_REFETCH_DELAY_SECS", "20")?;

    Ok(AppConfig {
        env,
        log_level,
        provider_base_url,
        provider_request_timeout_secs,
        provider_user_agent,
        recompute_primary_url,
        recompute_token,
        recompute_secondary_timeout_secs,
        recompute_refetch_delay_secs,
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
