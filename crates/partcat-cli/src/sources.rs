//! Source loading for the `run` and `sources` commands.
//!
//! Sources come from the catalog file, optionally extended by a bulk CSV
//! import. Invalid CSV rows and duplicate labels are logged and skipped.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use partcat_core::{AppConfig, CatalogSource, SiteProfile, SourceImport};

use crate::SourceArgs;

/// Resolves the site profile and the list of sources to crawl.
///
/// Without `--catalog`, a missing default catalog file is tolerated when a
/// sources CSV is given; the built-in site profile is then used.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed, or if no source is
/// left after filtering.
pub(crate) fn load_sources(
    config: &AppConfig,
    args: &SourceArgs,
) -> anyhow::Result<(SiteProfile, Vec<CatalogSource>)> {
    let catalog_path = args
        .catalog
        .as_deref()
        .unwrap_or(config.catalog_path.as_path());
    let catalog = if args.catalog.is_none() && args.sources_csv.is_some() && !catalog_path.exists()
    {
        tracing::info!(
            path = %catalog_path.display(),
            "no catalog file; using the built-in site profile"
        );
        partcat_core::CatalogFile::default()
    } else {
        partcat_core::load_catalog(catalog_path)
            .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?
    };

    let import = match &args.sources_csv {
        Some(path) => Some(read_sources_csv(path)?),
        None => None,
    };

    let sources = merge_sources(catalog.sources, import, &args.models);
    if sources.is_empty() {
        anyhow::bail!("no catalog source to process; check the catalog file, --sources-csv and --model");
    }
    Ok((catalog.site, sources))
}

fn read_sources_csv(path: &Path) -> anyhow::Result<SourceImport> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let import = partcat_core::parse_sources_csv(file)
        .with_context(|| format!("failed to read {}", path.display()))?;
    for rejected in &import.rejected {
        tracing::warn!(
            file = %path.display(),
            line = rejected.line,
            reason = %rejected.reason,
            "skipping source row"
        );
    }
    Ok(import)
}

/// Appends imported sources to the catalog ones, drops duplicate labels
/// (first occurrence wins, case-insensitive) and applies the label filter.
pub(crate) fn merge_sources(
    catalog_sources: Vec<CatalogSource>,
    import: Option<SourceImport>,
    models: &[String],
) -> Vec<CatalogSource> {
    let wanted: HashSet<String> = models.iter().map(|m| m.trim().to_lowercase()).collect();
    let mut seen = HashSet::new();

    catalog_sources
        .into_iter()
        .chain(import.into_iter().flat_map(|i| i.sources))
        .filter(|source| {
            let key = source.label.trim().to_lowercase();
            if !seen.insert(key) {
                tracing::warn!(label = %source.label, "duplicate source label; keeping the first");
                return false;
            }
            true
        })
        .filter(|source| wanted.is_empty() || wanted.contains(&source.label.trim().to_lowercase()))
        .collect()
}

/// Prints the resolved sources, one `label<TAB>url` line each.
///
/// # Errors
///
/// Returns an error if the sources cannot be loaded.
pub(crate) fn handle_sources(config: &AppConfig, args: &SourceArgs) -> anyhow::Result<()> {
    let (_, sources) = load_sources(config, args)?;
    for source in &sources {
        println!("{}\t{}", source.label, source.url);
    }
    println!("{} source(s)", sources.len());
    Ok(())
}
