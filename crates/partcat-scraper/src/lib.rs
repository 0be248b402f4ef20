pub mod client;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod price;
pub mod retry;
pub mod sink;

pub use client::{FetchedPage, PageFetcher};
pub use crawl::{crawl_catalog, CrawlReport, ModelSummary};
pub use error::ScraperError;
pub use extract::{CatalogExtractor, PageScan, MAX_PAGES};
pub use pagination::{strategy_from_config, PaginationStrategy, QueryPagination, SuffixPagination};
pub use price::{normalize_price, PriceNormalizer};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sink::{LogLevel, LogSink, RecordingSink, TracingSink};
