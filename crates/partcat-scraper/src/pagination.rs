//! Page-N URL derivation for paginated catalog listings.

use std::fmt::Debug;

use partcat_core::PaginationConfig;
use regex::Regex;
use reqwest::Url;

use crate::error::ScraperError;

/// Addresses the pages of one paginated listing.
pub trait PaginationStrategy: Debug + Send + Sync {
    /// URL of page `page` (1-based). Page 1 is always `start_url` unchanged.
    fn page_url(&self, start_url: &str, page: u32) -> String;

    /// Page number a pagination-control `href` points to, if any.
    fn page_number(&self, href: &str) -> Option<u32>;
}

/// Builds the strategy described by a site profile.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidPattern`] if the page-marker regex cannot
/// be compiled.
pub fn strategy_from_config(
    config: &PaginationConfig,
) -> Result<Box<dyn PaginationStrategy>, ScraperError> {
    Ok(match config {
        PaginationConfig::Suffix { extension } => Box::new(SuffixPagination::new(extension)?),
        PaginationConfig::Query { param } => Box::new(QueryPagination::new(param)),
    })
}

/// `-p{N}` inserted before the page extension: `ecran.html` becomes
/// `ecran-p2.html`. Query string and fragment are kept as they are.
#[derive(Debug, Clone)]
pub struct SuffixPagination {
    extension: String,
    marker: Regex,
}

impl SuffixPagination {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidPattern`] if the marker regex cannot be built.
    pub fn new(extension: &str) -> Result<Self, ScraperError> {
        let marker = Regex::new(&format!(r"-p(\d+){}", regex::escape(extension)))?;
        Ok(Self {
            extension: extension.to_owned(),
            marker,
        })
    }
}

impl PaginationStrategy for SuffixPagination {
    fn page_url(&self, start_url: &str, page: u32) -> String {
        if page <= 1 {
            return start_url.to_owned();
        }
        let split_at = start_url.find(['?', '#']).unwrap_or(start_url.len());
        let (path, tail) = start_url.split_at(split_at);
        match path.strip_suffix(self.extension.as_str()) {
            Some(stem) => format!("{stem}-p{page}{}{tail}", self.extension),
            None => format!("{path}-p{page}{tail}"),
        }
    }

    fn page_number(&self, href: &str) -> Option<u32> {
        self.marker
            .captures_iter(href)
            .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
            .last()
    }
}

/// `{param}={N}` query parameter; any existing value is replaced.
#[derive(Debug, Clone)]
pub struct QueryPagination {
    param: String,
}

impl QueryPagination {
    #[must_use]
    pub fn new(param: &str) -> Self {
        Self {
            param: param.to_owned(),
        }
    }
}

impl PaginationStrategy for QueryPagination {
    fn page_url(&self, start_url: &str, page: u32) -> String {
        if page <= 1 {
            return start_url.to_owned();
        }
        let Ok(mut url) = Url::parse(start_url) else {
            let joiner = if start_url.contains('?') { '&' } else { '?' };
            return format!("{start_url}{joiner}{}={page}", self.param);
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| *key != self.param)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(&self.param, &page.to_string());
        url.to_string()
    }

    fn page_number(&self, href: &str) -> Option<u32> {
        // Relative hrefs like "?page=3" only need a base to be parseable.
        let base = Url::parse("http://pagination.invalid/").ok()?;
        let url = base.join(href).ok()?;
        url.query_pairs()
            .find(|(key, _)| *key == self.param)
            .and_then(|(_, value)| value.parse().ok())
    }
}
