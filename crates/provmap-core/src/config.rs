use crate::app_config::{AppConfig, Environment};
use crate::geo::{GeoPoint, Viewport};
use crate::ConfigError;

/// Largest page the Search API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

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
/// Decoupled from the process environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
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

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PROVMAP_ENV", "development"));
    let log_level = or_default("PROVMAP_LOG_LEVEL", "info");

    let api_base_url = or_default("PROVMAP_API_BASE_URL", "http://localhost:8081/api/map");
    if api_base_url.trim().is_empty() {
        return Err(invalid("PROVMAP_API_BASE_URL", "must not be empty".to_string()));
    }

    let request_timeout_secs = parse_u64("PROVMAP_REQUEST_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "PROVMAP_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let user_agent = or_default("PROVMAP_USER_AGENT", "provmap/0.1 (provider-directory)");

    let page_size = parse_u32("PROVMAP_PAGE_SIZE", "20")?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(invalid(
            "PROVMAP_PAGE_SIZE",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }

    let max_retries = parse_u32("PROVMAP_MAX_RETRIES", "1")?;
    let retry_backoff_base_ms = parse_u64("PROVMAP_RETRY_BACKOFF_BASE_MS", "500")?;

    let initial_lat = parse_f64("PROVMAP_INITIAL_LAT", "20.5937")?;
    let initial_lng = parse_f64("PROVMAP_INITIAL_LNG", "78.9629")?;
    let initial_lat_span = parse_f64("PROVMAP_INITIAL_LAT_SPAN", "0.5")?;
    let initial_lng_span = parse_f64("PROVMAP_INITIAL_LNG_SPAN", "0.5")?;
    let initial_viewport = GeoPoint::new(initial_lat, initial_lng)
        .and_then(|center| Viewport::new(center, initial_lat_span, initial_lng_span))
        .map_err(|e| invalid("PROVMAP_INITIAL_LAT", e.to_string()))?;

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        request_timeout_secs,
        user_agent,
        page_size,
        max_retries,
        retry_backoff_base_ms,
        initial_viewport,
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
