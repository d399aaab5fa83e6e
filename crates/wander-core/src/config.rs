use crate::app_config::{AppConfig, Environment};
use crate::provider::{MAX_LIMIT, MAX_RADIUS_METERS};
use crate::ConfigError;

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

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`
/// lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

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

    let parse_bounded =
        |var: &str, default: &str, min: u32, max: u32| -> Result<u32, ConfigError> {
            let value = parse_u32(var, default)?;
            if (min..=max).contains(&value) {
                Ok(value)
            } else {
                Err(invalid(var, format!("must be between {min} and {max}")))
            }
        };

    let foursquare_client_id = require("FOURSQUARE_CLIENT_ID")?;
    let foursquare_client_secret = require("FOURSQUARE_CLIENT_SECRET")?;
    let ipdata_api_key = require("IPDATA_API_KEY")?;

    let env = parse_environment(&or_default("WANDER_ENV", "development"))?;

    let bind_addr = or_default("WANDER_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("WANDER_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("WANDER_LOG_LEVEL", "info");

    let search_radius_meters =
        parse_bounded("WANDER_SEARCH_RADIUS_METERS", "16000", 1, MAX_RADIUS_METERS)?;
    let search_limit = parse_bounded("WANDER_SEARCH_LIMIT", "50", 1, MAX_LIMIT)?;
    let search_attempts = parse_bounded("WANDER_SEARCH_ATTEMPTS", "3", 1, 10)?;

    let open_now = match or_default("WANDER_OPEN_NOW", "true").as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        other => {
            return Err(invalid(
                "WANDER_OPEN_NOW",
                format!("expected true/false, got '{other}'"),
            ))
        }
    };

    let smoothing = or_default("WANDER_SMOOTHING", "0.25")
        .parse::<f64>()
        .map_err(|e| invalid("WANDER_SMOOTHING", e.to_string()))?;
    if !(0.0..=1.0).contains(&smoothing) {
        return Err(invalid(
            "WANDER_SMOOTHING",
            "must be between 0 and 1".to_string(),
        ));
    }

    let request_timeout_secs = parse_u64("WANDER_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("WANDER_USER_AGENT", "wander/0.1 (venue-suggestions)");
    let max_retries = parse_u32("WANDER_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("WANDER_RETRY_BACKOFF_BASE_MS", "500")?;
    let session_ttl_secs = parse_u64("WANDER_SESSION_TTL_SECS", "1800")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        foursquare_client_id,
        foursquare_client_secret,
        ipdata_api_key,
        search_radius_meters,
        search_limit,
        search_attempts,
        open_now,
        smoothing,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        session_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WANDER_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
