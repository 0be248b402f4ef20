//! Bulk import of catalog sources from a semicolon-delimited file.
//!
//! Only the first two columns are read (label, URL). The first non-blank
//! row is taken as a header when its second cell is not an HTTP URL and is
//! skipped silently; every other unusable row is reported back to the caller.

use std::io::Read;

use crate::catalog::{validate_source, CatalogSource};
use crate::ConfigError;

/// A row that could not be turned into a [`CatalogSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line number in the input.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceImport {
    pub sources: Vec<CatalogSource>,
    pub rejected: Vec<RejectedRow>,
}

/// Reads `(label; url)` rows from `reader`.
///
/// # Errors
///
/// Returns [`ConfigError::SourcesCsv`] on I/O failure or malformed CSV
/// (e.g. invalid UTF-8). Individual bad rows do not fail the import.
pub fn parse_sources_csv<R: Read>(reader: R) -> Result<SourceImport, ConfigError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut import = SourceImport::default();
    let mut seen_data_row = false;

    for (idx, row) in csv_reader.records().enumerate() {
        let row = row?;
        let line = row.position().map_or(idx as u64 + 1, csv::Position::line);

        let label = row
            .get(0)
            .unwrap_or_default()
            .trim_start_matches('\u{feff}')
            .trim();
        let url = row.get(1).unwrap_or_default().trim();

        if label.is_empty() && url.is_empty() {
            continue;
        }

        let first_row = !seen_data_row;
        seen_data_row = true;
        if first_row && !url.starts_with("http://") && !url.starts_with("https://") {
            continue;
        }

        let source = CatalogSource {
            label: label.to_owned(),
            url: url.to_owned(),
        };
        match validate_source(&source) {
            Ok(()) => import.sources.push(source),
            Err(reason) => import.rejected.push(RejectedRow { line, reason }),
        }
    }

    Ok(import)
}
