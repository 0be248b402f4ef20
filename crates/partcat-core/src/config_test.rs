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
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let config = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(config.log_level, "info");
    assert_eq!(
        config.catalog_path,
        std::path::PathBuf::from("./config/catalog.yaml")
    );
    assert_eq!(config.scraper_request_timeout_secs, 15);
    assert_eq!(config.scraper_user_agent, DEFAULT_USER_AGENT);
    assert_eq!(config.scraper_max_attempts, 3);
    assert_eq!(config.scraper_backoff_base_ms, 1000);
    assert_eq!(config.scraper_backoff_jitter_ms, 0);
    assert_eq!(config.scraper_page_delay_min_ms, 1500);
    assert_eq!(config.scraper_page_delay_max_ms, 3500);
    assert_eq!(config.scraper_model_delay_ms, 2000);
    assert_eq!(config.repricing, RepricingParameters::default());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_LOG_LEVEL", "debug");
    map.insert("PARTCAT_CATALOG_PATH", "/etc/partcat/catalog.yaml");
    map.insert("PARTCAT_SCRAPER_MAX_ATTEMPTS", "5");
    map.insert("PARTCAT_SCRAPER_PAGE_DELAY_MIN_MS", "0");
    map.insert("PARTCAT_SCRAPER_PAGE_DELAY_MAX_MS", "0");
    map.insert("PARTCAT_MARKUP_COEFFICIENT", "1.5");
    map.insert("PARTCAT_FIXED_SURCHARGE", "15");
    map.insert("PARTCAT_TAX_COEFFICIENT", "1.055");

    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(
        config.catalog_path,
        std::path::PathBuf::from("/etc/partcat/catalog.yaml")
    );
    assert_eq!(config.scraper_max_attempts, 5);
    assert_eq!(config.scraper_page_delay_max_ms, 0);
    assert_eq!(
        config.repricing.markup_coefficient(),
        Decimal::from_str("1.5").unwrap()
    );
    assert_eq!(config.repricing.fixed_surcharge(), Decimal::from(15));
    assert_eq!(
        config.repricing.tax_coefficient(),
        Decimal::from_str("1.055").unwrap()
    );
}

#[test]
fn build_app_config_invalid_timeout_fails() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_SCRAPER_REQUEST_TIMEOUT_SECS", "fifteen");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTCAT_SCRAPER_REQUEST_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_zero_attempts_fails() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_SCRAPER_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTCAT_SCRAPER_MAX_ATTEMPTS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_jitter_must_stay_below_base() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_SCRAPER_BACKOFF_BASE_MS", "500");
    map.insert("PARTCAT_SCRAPER_BACKOFF_JITTER_MS", "500");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTCAT_SCRAPER_BACKOFF_JITTER_MS"),
        "got: {result:?}"
    );

    map.insert("PARTCAT_SCRAPER_BACKOFF_JITTER_MS", "499");
    assert!(build_app_config(lookup_from_map(&map)).is_ok());
}

#[test]
fn build_app_config_inverted_page_delay_fails() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_SCRAPER_PAGE_DELAY_MIN_MS", "4000");
    map.insert("PARTCAT_SCRAPER_PAGE_DELAY_MAX_MS", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTCAT_SCRAPER_PAGE_DELAY_MIN_MS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_malformed_coefficient_fails() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_MARKUP_COEFFICIENT", "1,6");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTCAT_MARKUP_COEFFICIENT"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_out_of_range_coefficient_fails() {
    let mut map = HashMap::new();
    map.insert("PARTCAT_TAX_COEFFICIENT", "0.8");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref reason, .. }) if reason.contains("tax")),
        "got: {result:?}"
    );
}
