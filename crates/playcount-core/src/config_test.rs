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

/// Returns a map with all required env vars populated.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("SHEET_ID", "sheet-123");
    m.insert("GOOGLE_ACCESS_TOKEN", "ya29.test-token");
    m
}

#[test]
fn build_app_config_fails_without_sheet_id() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHEET_ID"),
        "expected MissingEnvVar(SHEET_ID), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_access_token() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHEET_ID", "sheet-123");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "GOOGLE_ACCESS_TOKEN"),
        "expected MissingEnvVar(GOOGLE_ACCESS_TOKEN), got: {result:?}"
    );
}

#[test]
fn blank_required_var_counts_as_missing() {
    let mut map = full_env();
    map.insert("SHEET_ID", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHEET_ID"));
}

#[test]
fn build_app_config_applies_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.sheet_id, "sheet-123");
    assert_eq!(cfg.sheets_base_url, "https://sheets.googleapis.com/");
    assert_eq!(cfg.sheets.config, "Config");
    assert_eq!(cfg.sheets.views, "Views");
    assert_eq!(cfg.sheets.debug, "Debug");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.engines, EngineKind::default_chain());
    assert_eq!(cfg.nav_timeout_secs, 60);
    assert_eq!(cfg.settle_ms, 1500);
    assert_eq!(cfg.delay_min_ms, 1200);
    assert_eq!(cfg.delay_max_ms, 2000);
    assert_eq!(cfg.http_timeout_secs, 30);
    assert!(cfg.chromium_path.is_none());
}

#[test]
fn engine_list_override_keeps_order() {
    let mut map = full_env();
    map.insert("PLAYCOUNT_ENGINES", "chromium-legacy, chromium-stealth");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.engines,
        vec![EngineKind::ChromiumLegacy, EngineKind::ChromiumStealth]
    );
}

#[test]
fn unknown_engine_is_rejected() {
    let mut map = full_env();
    map.insert("PLAYCOUNT_ENGINES", "chromium,netscape");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PLAYCOUNT_ENGINES"),
        "expected InvalidEnvVar(PLAYCOUNT_ENGINES), got: {result:?}"
    );
}

#[test]
fn duplicate_engine_is_rejected() {
    assert!(parse_engine_list("chromium,chromium").is_err());
}

#[test]
fn empty_engine_list_is_rejected() {
    assert!(parse_engine_list(" , ").is_err());
}

#[test]
fn invalid_timeout_is_rejected() {
    let mut map = full_env();
    map.insert("PLAYCOUNT_NAV_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PLAYCOUNT_NAV_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PLAYCOUNT_NAV_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn inverted_delay_window_is_rejected() {
    let mut map = full_env();
    map.insert("PLAYCOUNT_DELAY_MIN_MS", "3000");
    map.insert("PLAYCOUNT_DELAY_MAX_MS", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PLAYCOUNT_DELAY_MIN_MS"
    ));
}

#[test]
fn chromium_path_is_picked_up() {
    let mut map = full_env();
    map.insert("CHROMIUM_PATH", "/usr/bin/chromium");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.chromium_path.as_deref(), Some("/usr/bin/chromium"));
}

#[test]
fn debug_output_redacts_access_token() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("ya29.test-token"));
    assert!(rendered.contains("[redacted]"));
}
