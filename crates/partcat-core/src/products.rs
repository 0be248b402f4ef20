use std::collections::BTreeMap;

/// Placeholder written into text fields the catalog page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// One component listing scraped from a catalog page, before repricing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProductRecord {
    /// Catalog label supplied by the caller (e.g. `"iPhone 15"`), never scraped.
    pub model_label: String,
    /// Cleaned display name, or [`NOT_AVAILABLE`].
    pub component_name: String,
    /// Vendor part reference, or [`NOT_AVAILABLE`].
    pub reference: String,
    /// Price text exactly as it appeared on the page, kept for audit.
    pub price_raw: String,
    /// Normalized value of `price_raw`; `0.0` when it could not be parsed.
    pub price_numeric: f64,
    /// Absolute product URL, or the listing page URL when no link was found.
    pub source_link: String,
    /// Site-specific extra columns (column name to cell text).
    pub extra: BTreeMap<String, String>,
}

/// A [`RawProductRecord`] with its four currency-formatted price columns.
///
/// `client_price_ttc` always carries a whole currency amount; the other
/// three keep two fractional digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedRecord {
    pub model_label: String,
    pub component_name: String,
    pub reference: String,
    pub price_raw: String,
    pub source_link: String,
    pub extra: BTreeMap<String, String>,
    /// Supplier cost before markup.
    pub supplier_price_ht: String,
    /// Cost multiplied by the markup coefficient.
    pub gross_margin_ht: String,
    /// Margin price plus the fixed surcharge.
    pub intermediate_price_ht: String,
    /// Intermediate price with tax, rounded up to a whole unit.
    pub client_price_ttc: String,
}
