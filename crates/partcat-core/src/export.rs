//! Sorted, semicolon-delimited export of priced records.

use std::collections::BTreeSet;

use crate::error::ExportError;
use crate::products::PricedRecord;

pub const COLUMN_MODEL: &str = "marque_modele";
pub const COLUMN_COMPONENT: &str = "nom_composant";
pub const COLUMN_REFERENCE: &str = "reference";
pub const COLUMN_SUPPLIER_HT: &str = "Prix Fournisseur HT";
pub const COLUMN_MARGIN_HT: &str = "Marge Brute HT";
pub const COLUMN_INTERMEDIATE_HT: &str = "Prix Intermédiaire + M.O. HT";
pub const COLUMN_CLIENT_TTC: &str = "Prix Client TTC";
pub const COLUMN_PRICE_RAW: &str = "price_raw";
pub const COLUMN_LINK: &str = "link";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field delimiter; semicolon for spreadsheet applications in comma-decimal locales.
    pub delimiter: u8,
    /// Keep the untouched scraped price text as a column.
    pub include_raw_price: bool,
    /// Prefix the CSV blob with a UTF-8 byte order mark.
    pub byte_order_mark: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            include_raw_price: true,
            byte_order_mark: false,
        }
    }
}

/// Header plus string cells, ready to be written to a worksheet range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Sorts records by model then component (case-insensitive, stable) and
    /// lays them out in the fixed column order, followed by any extra
    /// columns in name order.
    ///
    /// Returns `None` for an empty input.
    #[must_use]
    pub fn table(&self, records: &[PricedRecord]) -> Option<ExportTable> {
        if records.is_empty() {
            return None;
        }

        let mut sorted: Vec<&PricedRecord> = records.iter().collect();
        sorted.sort_by_cached_key(|r| {
            (
                r.model_label.to_lowercase(),
                r.component_name.to_lowercase(),
            )
        });

        let fixed = self.fixed_columns();
        let extra_columns: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.extra.keys().map(String::as_str))
            .filter(|key| !fixed.contains(key))
            .collect();

        let header = fixed
            .iter()
            .copied()
            .chain(extra_columns.iter().copied())
            .map(str::to_owned)
            .collect();

        let rows = sorted
            .into_iter()
            .map(|record| {
                let mut row = vec![
                    record.model_label.clone(),
                    record.component_name.clone(),
                    record.reference.clone(),
                    record.supplier_price_ht.clone(),
                    record.gross_margin_ht.clone(),
                    record.intermediate_price_ht.clone(),
                    record.client_price_ttc.clone(),
                ];
                if self.options.include_raw_price {
                    row.push(record.price_raw.clone());
                }
                row.push(record.source_link.clone());
                row.extend(
                    extra_columns
                        .iter()
                        .map(|key| record.extra.get(*key).cloned().unwrap_or_default()),
                );
                row
            })
            .collect();

        Some(ExportTable { header, rows })
    }

    /// Serializes records to delimited text with a header row.
    ///
    /// Returns `Ok(None)` for an empty input; no header-only output is ever
    /// produced.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the in-memory CSV writer fails.
    pub fn serialize(&self, records: &[PricedRecord]) -> Result<Option<String>, ExportError> {
        let Some(table) = self.table(records) else {
            return Ok(None);
        };

        let mut buffer = Vec::new();
        if self.options.byte_order_mark {
            buffer.extend_from_slice(UTF8_BOM);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .from_writer(buffer);
        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Flush(e.error().to_string()))?;
        Ok(Some(String::from_utf8(bytes)?))
    }

    fn fixed_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![
            COLUMN_MODEL,
            COLUMN_COMPONENT,
            COLUMN_REFERENCE,
            COLUMN_SUPPLIER_HT,
            COLUMN_MARGIN_HT,
            COLUMN_INTERMEDIATE_HT,
            COLUMN_CLIENT_TTC,
        ];
        if self.options.include_raw_price {
            columns.push(COLUMN_PRICE_RAW);
        }
        columns.push(COLUMN_LINK);
        columns
    }
}
