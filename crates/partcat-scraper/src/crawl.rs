//! Sequential crawl over a list of catalog sources.

use std::time::Duration;

use partcat_core::{CatalogSource, RawProductRecord};

use crate::extract::CatalogExtractor;
use crate::sink::LogSink;

/// Record count contributed by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub label: String,
    pub records: usize,
}

/// Accumulated output of [`crawl_catalog`].
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Records of every source, in crawl order.
    pub records: Vec<RawProductRecord>,
    /// One entry per source, in crawl order.
    pub models: Vec<ModelSummary>,
}

impl CrawlReport {
    /// Labels of sources that produced no record.
    pub fn empty_models(&self) -> impl Iterator<Item = &str> {
        self.models
            .iter()
            .filter(|m| m.records == 0)
            .map(|m| m.label.as_str())
    }
}

/// Crawls `sources` one after the other, pausing `model_delay` between two
/// consecutive sources.
///
/// A source that fails or yields nothing is reported and skipped; the crawl
/// itself never fails.
pub async fn crawl_catalog(
    extractor: &CatalogExtractor,
    sources: &[CatalogSource],
    model_delay: Duration,
    sink: &dyn LogSink,
) -> CrawlReport {
    let mut report = CrawlReport::default();
    let total = sources.len();

    for (index, source) in sources.iter().enumerate() {
        if index > 0 && !model_delay.is_zero() {
            tokio::time::sleep(model_delay).await;
        }

        sink.info(&format!("[{}/{total}] {}", index + 1, source.label));
        let records = extractor
            .extract_model(&source.label, &source.url, sink)
            .await;

        if records.is_empty() {
            sink.warn(&format!("{} contributed no components", source.label));
        }
        report.models.push(ModelSummary {
            label: source.label.clone(),
            records: records.len(),
        });
        report.records.extend(records);
    }

    tracing::info!(
        sources = total,
        records = report.records.len(),
        empty = report.empty_models().count(),
        "crawl finished"
    );
    report
}
