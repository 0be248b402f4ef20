//! HTTP page retrieval with bounded retries.

use std::time::Duration;

use partcat_core::AppConfig;
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::sink::LogSink;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A successfully retrieved page body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested.
    pub url: String,
    pub body: String,
}

/// Retrieves catalog pages with a static browser `User-Agent`.
///
/// Every network failure and every non-2xx status is retried according to
/// the [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(CONNECT_TIMEOUT))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, retry })
    }

    /// Builds a fetcher from the `PARTCAT_SCRAPER_*` settings.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let retry = RetryPolicy::new(
            config.scraper_max_attempts,
            Duration::from_millis(config.scraper_backoff_base_ms),
        )
        .with_jitter(Duration::from_millis(config.scraper_backoff_jitter_ms));
        Self::new(
            Duration::from_secs(config.scraper_request_timeout_secs),
            &config.scraper_user_agent,
            retry,
        )
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches `url`, retrying transient failures.
    ///
    /// Each failed attempt is reported to `sink`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `url` does not parse (not retried).
    /// - [`ScraperError::RetriesExhausted`] wrapping the last failure once
    ///   every attempt failed.
    pub async fn fetch(&self, url: &str, sink: &dyn LogSink) -> Result<FetchedPage, ScraperError> {
        let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        let body = retry_with_backoff(&self.retry, sink, url, |_attempt| {
            let request_url = parsed.clone();
            async move { self.get_body(request_url).await }
        })
        .await
        .map_err(|last| ScraperError::RetriesExhausted {
            url: url.to_owned(),
            attempts: self.retry.max_attempts(),
            last: Box::new(last),
        })?;

        tracing::debug!(url, bytes = body.len(), "page fetched");
        Ok(FetchedPage {
            url: url.to_owned(),
            body,
        })
    }

    async fn get_body(&self, url: Url) -> Result<String, ScraperError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
