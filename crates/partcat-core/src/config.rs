use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::AppConfig;
use crate::pricing::RepricingParameters;
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

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
/// Every variable has a default; only malformed or inconsistent values fail.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_decimal = |var: &str, default: &str| -> Result<Decimal, ConfigError> {
        let raw = or_default(var, default);
        Decimal::from_str(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("PARTCAT_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("PARTCAT_CATALOG_PATH", "./config/catalog.yaml"));

    let scraper_request_timeout_secs = parse_u64("PARTCAT_SCRAPER_REQUEST_TIMEOUT_SECS", "15")?;
    let scraper_user_agent = or_default("PARTCAT_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_attempts = parse_u32("PARTCAT_SCRAPER_MAX_ATTEMPTS", "3")?;
    let scraper_backoff_base_ms = parse_u64("PARTCAT_SCRAPER_BACKOFF_BASE_MS", "1000")?;
    let scraper_backoff_jitter_ms = parse_u64("PARTCAT_SCRAPER_BACKOFF_JITTER_MS", "0")?;
    let scraper_page_delay_min_ms = parse_u64("PARTCAT_SCRAPER_PAGE_DELAY_MIN_MS", "1500")?;
    let scraper_page_delay_max_ms = parse_u64("PARTCAT_SCRAPER_PAGE_DELAY_MAX_MS", "3500")?;
    let scraper_model_delay_ms = parse_u64("PARTCAT_SCRAPER_MODEL_DELAY_MS", "2000")?;

    if scraper_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARTCAT_SCRAPER_MAX_ATTEMPTS".to_string(),
            reason: "at least one attempt is required".to_string(),
        });
    }

    // Jitter must stay below the base delay or two consecutive backoffs
    // could come out equal.
    if scraper_backoff_jitter_ms > 0 && scraper_backoff_jitter_ms >= scraper_backoff_base_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARTCAT_SCRAPER_BACKOFF_JITTER_MS".to_string(),
            reason: format!(
                "must be lower than PARTCAT_SCRAPER_BACKOFF_BASE_MS ({scraper_backoff_base_ms})"
            ),
        });
    }

    if scraper_page_delay_min_ms > scraper_page_delay_max_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARTCAT_SCRAPER_PAGE_DELAY_MIN_MS".to_string(),
            reason: format!(
                "{scraper_page_delay_min_ms} exceeds PARTCAT_SCRAPER_PAGE_DELAY_MAX_MS ({scraper_page_delay_max_ms})"
            ),
        });
    }

    let defaults = RepricingParameters::default();
    let markup = parse_decimal(
        "PARTCAT_MARKUP_COEFFICIENT",
        &defaults.markup_coefficient().to_string(),
    )?;
    let surcharge = parse_decimal(
        "PARTCAT_FIXED_SURCHARGE",
        &defaults.fixed_surcharge().to_string(),
    )?;
    let tax = parse_decimal(
        "PARTCAT_TAX_COEFFICIENT",
        &defaults.tax_coefficient().to_string(),
    )?;
    let repricing =
        RepricingParameters::new(markup, surcharge, tax).map_err(|e| ConfigError::InvalidEnvVar {
            var: "PARTCAT_MARKUP_COEFFICIENT / PARTCAT_FIXED_SURCHARGE / PARTCAT_TAX_COEFFICIENT"
                .to_string(),
            reason: e.to_string(),
        })?;

    Ok(AppConfig {
        log_level,
        catalog_path,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_attempts,
        scraper_backoff_base_ms,
        scraper_backoff_jitter_ms,
        scraper_page_delay_min_ms,
        scraper_page_delay_max_ms,
        scraper_model_delay_ms,
        repricing,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
