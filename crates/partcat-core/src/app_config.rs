use std::path::PathBuf;

use crate::pricing::RepricingParameters;

/// Process-level settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Total attempts per page, first try included.
    pub scraper_max_attempts: u32,
    /// Base delay for exponential backoff: `backoff_base_ms * 2^attempt`.
    pub scraper_backoff_base_ms: u64,
    /// Upper bound of the random jitter added to each backoff delay.
    pub scraper_backoff_jitter_ms: u64,
    pub scraper_page_delay_min_ms: u64,
    pub scraper_page_delay_max_ms: u64,
    /// Pause between two consecutive catalog sources.
    pub scraper_model_delay_ms: u64,
    pub repricing: RepricingParameters,
}
