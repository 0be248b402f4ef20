use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One catalog listing to crawl: a display label and its first page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    pub label: String,
    pub url: String,
}

/// How page N of a paginated listing is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaginationConfig {
    /// `-p{N}` inserted before the page extension: `ecran.html` becomes `ecran-p2.html`.
    Suffix { extension: String },
    /// `?{param}={N}` query parameter.
    Query { param: String },
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig::Suffix {
            extension: ".html".to_owned(),
        }
    }
}

/// Correction for pages that render prices in minor units without any
/// separator (`"2499"` meaning 24.99).
///
/// A separator-free value strictly above `threshold` is divided by
/// `divisor`. This misfires on genuinely large whole prices, so it can be
/// turned off per site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinorUnitCorrection {
    pub threshold: f64,
    pub divisor: f64,
}

impl Default for MinorUnitCorrection {
    fn default() -> Self {
        Self {
            threshold: 1000.0,
            divisor: 100.0,
        }
    }
}

/// Structural description of the vendor catalog pages.
///
/// Every field defaults to the layout of the reference parts vendor, so a
/// catalog file only needs to list what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Used to resolve relative product links.
    pub base_url: String,
    pub product_selector: String,
    /// Tried in order; the first element found supplies the component name.
    pub name_selectors: Vec<String>,
    /// Tried in order; the first element found supplies the price text.
    pub price_selectors: Vec<String>,
    pub link_selector: String,
    /// Regex matched against each text node of a product; capture group 1
    /// is the reference.
    pub reference_pattern: String,
    pub pagination_selector: String,
    pub pagination: PaginationConfig,
    /// `null` in the catalog file disables the correction.
    pub minor_unit_correction: Option<MinorUnitCorrection>,
    /// Additional export columns: column name to CSS selector.
    pub extra_fields: BTreeMap<String, String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "http://www.visiodirect-mobile.com".to_owned(),
            product_selector: "div.cadre_prod".to_owned(),
            name_selectors: vec!["h3".to_owned(), "h4".to_owned()],
            price_selectors: vec![".price_item".to_owned(), ".prix".to_owned()],
            link_selector: "a[href]".to_owned(),
            reference_pattern: r"R[ée]f\.\s*:?\s*(.+)".to_owned(),
            pagination_selector: "div.pagination a".to_owned(),
            pagination: PaginationConfig::default(),
            minor_unit_correction: Some(MinorUnitCorrection::default()),
            extra_fields: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub site: SiteProfile,
    #[serde(default)]
    pub sources: Vec<CatalogSource>,
}

/// Load and validate a catalog file (site profile plus sources) from YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_catalog(&content)
}

/// Parse and validate catalog YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_catalog(yaml: &str) -> Result<CatalogFile, ConfigError> {
    let catalog: CatalogFile = serde_yaml::from_str(yaml)?;
    validate_site(&catalog.site)?;
    validate_sources(&catalog.sources)?;
    Ok(catalog)
}

/// Checks a single source: non-empty label and an HTTP(S) URL.
///
/// # Errors
///
/// Returns a human-readable reason when the source is unusable.
pub fn validate_source(source: &CatalogSource) -> Result<(), String> {
    if source.label.trim().is_empty() {
        return Err("label must be non-empty".to_string());
    }
    let url = source.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!(
            "url for '{}' must start with http:// or https://, got '{}'",
            source.label, source.url
        ));
    }
    Ok(())
}

fn validate_sources(sources: &[CatalogSource]) -> Result<(), ConfigError> {
    let mut seen_labels = HashSet::new();

    for source in sources {
        validate_source(source).map_err(ConfigError::Validation)?;

        if !seen_labels.insert(source.label.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source label: '{}'",
                source.label
            )));
        }
    }

    Ok(())
}

fn validate_site(site: &SiteProfile) -> Result<(), ConfigError> {
    let required = [
        ("product_selector", &site.product_selector),
        ("link_selector", &site.link_selector),
        ("reference_pattern", &site.reference_pattern),
        ("pagination_selector", &site.pagination_selector),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site.{field} must be non-empty"
            )));
        }
    }

    if site.name_selectors.is_empty() || site.price_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "site.name_selectors and site.price_selectors need at least one entry".to_string(),
        ));
    }

    if let Some(correction) = site.minor_unit_correction {
        if correction.divisor <= 0.0 || correction.threshold < 0.0 {
            return Err(ConfigError::Validation(format!(
                "site.minor_unit_correction needs divisor > 0 and threshold >= 0, got {correction:?}"
            )));
        }
    }

    match &site.pagination {
        PaginationConfig::Suffix { extension } if extension.is_empty() => Err(
            ConfigError::Validation("site.pagination.extension must be non-empty".to_string()),
        ),
        PaginationConfig::Query { param } if param.is_empty() => Err(ConfigError::Validation(
            "site.pagination.param must be non-empty".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
