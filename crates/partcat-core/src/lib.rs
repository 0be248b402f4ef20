pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod pricing;
pub mod products;
pub mod sources;

pub use app_config::AppConfig;
pub use catalog::{
    load_catalog, parse_catalog, validate_source, CatalogFile, CatalogSource,
    MinorUnitCorrection, PaginationConfig, SiteProfile,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ExportError, PricingError};
pub use export::{ExportOptions, ExportTable, Exporter};
pub use pricing::{PriceBreakdown, PriceFormat, RepricingEngine, RepricingParameters};
pub use products::{PricedRecord, RawProductRecord, NOT_AVAILABLE};
pub use sources::{parse_sources_csv, RejectedRow, SourceImport};
