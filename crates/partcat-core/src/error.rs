use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("failed to read sources CSV: {0}")]
    SourcesCsv(#[from] csv::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("{name} must be at least {min}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: Decimal,
        value: Decimal,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Flush(String),

    #[error("exported CSV is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
