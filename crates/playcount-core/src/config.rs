use crate::app_config::{AppConfig, EngineKind, SheetNames};
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
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let sheet_id = require("SHEET_ID")?;
    let access_token = require("GOOGLE_ACCESS_TOKEN")?;

    let sheets_base_url = or_default("PLAYCOUNT_SHEETS_BASE_URL", "https://sheets.googleapis.com/");
    let sheets = SheetNames {
        config: or_default("PLAYCOUNT_CONFIG_SHEET", "Config"),
        views: or_default("PLAYCOUNT_VIEWS_SHEET", "Views"),
        debug: or_default("PLAYCOUNT_DEBUG_SHEET", "Debug"),
    };
    let log_level = or_default("PLAYCOUNT_LOG_LEVEL", "info");

    let engines = match lookup("PLAYCOUNT_ENGINES") {
        Ok(raw) => parse_engine_list(&raw).map_err(|reason| ConfigError::InvalidEnvVar {
            var: "PLAYCOUNT_ENGINES".to_string(),
            reason,
        })?,
        Err(_) => EngineKind::default_chain(),
    };

    let nav_timeout_secs = parse_u64("PLAYCOUNT_NAV_TIMEOUT_SECS", "60")?;
    let settle_ms = parse_u64("PLAYCOUNT_SETTLE_MS", "1500")?;
    let delay_min_ms = parse_u64("PLAYCOUNT_DELAY_MIN_MS", "1200")?;
    let delay_max_ms = parse_u64("PLAYCOUNT_DELAY_MAX_MS", "2000")?;
    if delay_min_ms > delay_max_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "PLAYCOUNT_DELAY_MIN_MS".to_string(),
            reason: format!("{delay_min_ms} exceeds PLAYCOUNT_DELAY_MAX_MS ({delay_max_ms})"),
        });
    }
    let http_timeout_secs = parse_u64("PLAYCOUNT_HTTP_TIMEOUT_SECS", "30")?;
    let chromium_path = lookup("CHROMIUM_PATH").ok().filter(|p| !p.is_empty());

    Ok(AppConfig {
        sheet_id,
        access_token,
        sheets_base_url,
        sheets,
        log_level,
        engines,
        nav_timeout_secs,
        settle_ms,
        delay_min_ms,
        delay_max_ms,
        http_timeout_secs,
        chromium_path,
    })
}

/// Parse a comma-separated engine priority list, preserving order.
///
/// # Errors
///
/// Returns a human-readable reason when an identifier is unknown, repeated,
/// or the list is empty.
pub fn parse_engine_list(raw: &str) -> Result<Vec<EngineKind>, String> {
    let mut engines = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind = part.parse::<EngineKind>()?;
        if engines.contains(&kind) {
            return Err(format!("engine \"{kind}\" listed twice"));
        }
        engines.push(kind);
    }
    if engines.is_empty() {
        return Err("engine list is empty".to_string());
    }
    Ok(engines)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
