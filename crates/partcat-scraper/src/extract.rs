//! Product extraction from paginated catalog listings.

use std::collections::BTreeMap;
use std::time::Duration;

use partcat_core::{RawProductRecord, SiteProfile, NOT_AVAILABLE};
use rand::Rng;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::client::PageFetcher;
use crate::error::ScraperError;
use crate::pagination::{strategy_from_config, PaginationStrategy};
use crate::price::PriceNormalizer;
use crate::sink::LogSink;

/// Hard stop for runaway pagination controls.
pub const MAX_PAGES: u32 = 200;

const DEFAULT_PAGE_DELAY_MIN: Duration = Duration::from_millis(1500);
const DEFAULT_PAGE_DELAY_MAX: Duration = Duration::from_millis(3500);

/// Everything pulled out of a single listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageScan {
    /// Product containers matched on the page, extractable or not.
    pub container_count: usize,
    pub records: Vec<RawProductRecord>,
    /// One message per container that was skipped.
    pub failures: Vec<String>,
    /// Highest page number linked from the pagination controls.
    pub max_page: Option<u32>,
}

#[derive(Debug)]
struct Selectors {
    product: Selector,
    names: Vec<Selector>,
    prices: Vec<Selector>,
    link: Selector,
    pagination: Selector,
    extra: Vec<(String, Selector)>,
}

impl Selectors {
    fn compile(site: &SiteProfile) -> Result<Self, ScraperError> {
        Ok(Self {
            product: parse_selector(&site.product_selector)?,
            names: parse_selectors(&site.name_selectors)?,
            prices: parse_selectors(&site.price_selectors)?,
            link: parse_selector(&site.link_selector)?,
            pagination: parse_selector(&site.pagination_selector)?,
            extra: site
                .extra_fields
                .iter()
                .map(|(column, css)| parse_selector(css).map(|s| (column.clone(), s)))
                .collect::<Result<_, _>>()?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::InvalidSelector {
        selector: css.to_owned(),
        reason: e.to_string(),
    })
}

fn parse_selectors(list: &[String]) -> Result<Vec<Selector>, ScraperError> {
    list.iter().map(|css| parse_selector(css)).collect()
}

/// Crawls every page of one catalog listing and turns product containers
/// into [`RawProductRecord`]s.
#[derive(Debug)]
pub struct CatalogExtractor {
    fetcher: PageFetcher,
    base_url: Option<Url>,
    selectors: Selectors,
    reference: Regex,
    pagination: Box<dyn PaginationStrategy>,
    normalizer: PriceNormalizer,
    page_delay: (Duration, Duration),
}

impl CatalogExtractor {
    /// Compiles the site profile's selectors, reference pattern and
    /// pagination strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] or
    /// [`ScraperError::InvalidPattern`] if the profile does not compile.
    pub fn new(fetcher: PageFetcher, site: &SiteProfile) -> Result<Self, ScraperError> {
        let base_url = match Url::parse(&site.base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(base_url = %site.base_url, error = %e, "unusable base URL; relative links resolve against the page URL");
                None
            }
        };
        Ok(Self {
            fetcher,
            base_url,
            selectors: Selectors::compile(site)?,
            reference: Regex::new(&site.reference_pattern)?,
            pagination: strategy_from_config(&site.pagination)?,
            normalizer: PriceNormalizer::new(site.minor_unit_correction),
            page_delay: (DEFAULT_PAGE_DELAY_MIN, DEFAULT_PAGE_DELAY_MAX),
        })
    }

    /// Random pause range between two pages of the same listing.
    /// A reversed range is reordered.
    #[must_use]
    pub fn with_page_delay(mut self, min: Duration, max: Duration) -> Self {
        self.page_delay = (min.min(max), min.max(max));
        self
    }

    /// Extracts every product of the listing starting at `start_url`.
    ///
    /// Never fails: a page that cannot be fetched ends the listing and the
    /// records gathered so far are returned. Progress goes to `sink`.
    pub async fn extract_model(
        &self,
        model_label: &str,
        start_url: &str,
        sink: &dyn LogSink,
    ) -> Vec<RawProductRecord> {
        sink.info(&format!("Scraping components for {model_label}"));

        let mut records = Vec::new();
        let mut current_page = 1u32;
        let mut total_pages = 1u32;

        while current_page <= total_pages {
            if current_page > 1 {
                self.pause_between_pages().await;
            }

            let url = self.pagination.page_url(start_url, current_page);
            sink.info(&format!("  page {current_page}/{total_pages}: {url}"));

            let page = match self.fetcher.fetch(&url, sink).await {
                Ok(page) => page,
                Err(e) => {
                    sink.error(&format!(
                        "  stopping {model_label} at page {current_page}: {e}"
                    ));
                    break;
                }
            };

            let scan = self.scan_page(&page.body, &page.url, model_label);
            for failure in &scan.failures {
                sink.error(&format!("  page {current_page}: {failure}"));
            }

            if scan.container_count == 0 {
                if current_page == 1 {
                    sink.warn(&format!(
                        "  no components found for {model_label} (page 1)"
                    ));
                } else {
                    sink.debug(&format!("  page {current_page} is empty, end of listing"));
                }
                break;
            }

            if current_page == 1 {
                total_pages = scan.max_page.unwrap_or(1).clamp(1, MAX_PAGES);
                if scan.max_page.is_some_and(|max| max > MAX_PAGES) {
                    sink.warn(&format!(
                        "  {model_label} links to more than {MAX_PAGES} pages; only the first {MAX_PAGES} are crawled"
                    ));
                }
                if total_pages > 1 {
                    sink.info(&format!("  {total_pages} pages found for {model_label}"));
                }
            }

            let extracted = scan.records.len();
            records.extend(scan.records);
            sink.success(&format!(
                "  {extracted} components extracted (total: {})",
                records.len()
            ));

            current_page += 1;
        }

        tracing::info!(model = model_label, records = records.len(), "listing done");
        records
    }

    /// Extracts products and the pagination bound from one page's HTML.
    ///
    /// `page_url` is the fallback link for products without one and the
    /// base for relative links when no site base URL is configured.
    #[must_use]
    pub fn scan_page(&self, html: &str, page_url: &str, model_label: &str) -> PageScan {
        let document = Html::parse_document(html);
        let mut scan = PageScan::default();

        for (index, container) in document.select(&self.selectors.product).enumerate() {
            scan.container_count += 1;
            match self.extract_product(container, page_url, model_label) {
                Some(record) => scan.records.push(record),
                None => scan.failures.push(format!(
                    "product #{} has neither a name nor a price, skipped",
                    index + 1
                )),
            }
        }

        scan.max_page = document
            .select(&self.selectors.pagination)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| self.pagination.page_number(href))
            .max();

        scan
    }

    fn extract_product(
        &self,
        container: ElementRef<'_>,
        page_url: &str,
        model_label: &str,
    ) -> Option<RawProductRecord> {
        let name = first_text(container, &self.selectors.names);
        let price = first_text(container, &self.selectors.prices);
        if name.is_none() && price.is_none() {
            return None;
        }

        let price_raw = price.unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        let price_numeric = self.normalizer.normalize(&price_raw);

        let extra: BTreeMap<String, String> = self
            .selectors
            .extra
            .iter()
            .filter_map(|(column, selector)| {
                first_text(container, std::slice::from_ref(selector))
                    .map(|text| (column.clone(), text))
            })
            .collect();

        Some(RawProductRecord {
            model_label: model_label.to_owned(),
            component_name: name.unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            reference: self
                .reference_in(container)
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            price_raw,
            price_numeric,
            source_link: self.link_in(container, page_url),
            extra,
        })
    }

    /// First text node matching the reference pattern; capture group 1.
    fn reference_in(&self, container: ElementRef<'_>) -> Option<String> {
        container.text().find_map(|node| {
            let caps = self.reference.captures(node)?;
            let reference = caps.get(1)?.as_str().trim();
            (!reference.is_empty()).then(|| reference.to_owned())
        })
    }

    fn link_in(&self, container: ElementRef<'_>, page_url: &str) -> String {
        let href = container
            .select(&self.selectors.link)
            .find_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty());
        let Some(href) = href else {
            return page_url.to_owned();
        };

        if let Ok(absolute) = Url::parse(href) {
            return absolute.to_string();
        }
        let base = self.base_url.clone().or_else(|| Url::parse(page_url).ok());
        base.and_then(|base| base.join(href).ok())
            .map_or_else(|| page_url.to_owned(), |url| url.to_string())
    }

    async fn pause_between_pages(&self) {
        let (min, max) = self.page_delay;
        let delay = if max > min {
            rand::rng().random_range(min..=max)
        } else {
            min
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Whitespace-collapsed text of the first non-empty match, trying
/// selectors in order.
fn first_text(container: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        container.select(selector).find_map(|element| {
            let text: String = element.text().collect();
            let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!cleaned.is_empty()).then_some(cleaned)
        })
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
