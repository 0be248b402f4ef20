//! The `run` command: crawl, reprice, export.

use std::time::Duration;

use anyhow::Context;
use partcat_core::{
    AppConfig, ExportOptions, Exporter, PricedRecord, RepricingEngine, RepricingParameters,
};
use partcat_scraper::{crawl_catalog, CatalogExtractor, PageFetcher, TracingSink};

use crate::sources::load_sources;
use crate::RunArgs;

/// Per-invocation repricing parameters: CLI flags over environment defaults.
pub(crate) fn resolve_parameters(
    defaults: &RepricingParameters,
    args: &RunArgs,
) -> anyhow::Result<RepricingParameters> {
    RepricingParameters::new(
        args.markup.unwrap_or(defaults.markup_coefficient()),
        args.surcharge.unwrap_or(defaults.fixed_surcharge()),
        args.tax.unwrap_or(defaults.tax_coefficient()),
    )
    .context("invalid repricing parameters")
}

pub(crate) fn export_options(args: &RunArgs) -> ExportOptions {
    ExportOptions {
        include_raw_price: !args.no_raw_price,
        byte_order_mark: args.bom,
        ..ExportOptions::default()
    }
}

/// Crawls every source, reprices the scraped components and writes the CSV.
///
/// Per-page and per-source failures are logged by the crawl and do not
/// stop the run; only an entirely empty result is an error.
///
/// # Errors
///
/// Returns an error if configuration is invalid, no record was extracted,
/// or the output cannot be written.
pub(crate) async fn handle_run(config: &AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    let params = resolve_parameters(&config.repricing, args)?;
    let (site, sources) = load_sources(config, &args.sources)?;

    if args.dry_run {
        let labels: Vec<&str> = sources.iter().map(|s| s.label.as_str()).collect();
        println!(
            "dry-run: would crawl {} source(s): [{}]",
            sources.len(),
            labels.join(", ")
        );
        println!(
            "dry-run: markup {} / surcharge {} / tax {}",
            params.markup_coefficient(),
            params.fixed_surcharge(),
            params.tax_coefficient()
        );
        return Ok(());
    }

    let fetcher = PageFetcher::from_config(config).context("failed to build HTTP client")?;
    let extractor = CatalogExtractor::new(fetcher, &site)
        .context("invalid site profile")?
        .with_page_delay(
            Duration::from_millis(config.scraper_page_delay_min_ms),
            Duration::from_millis(config.scraper_page_delay_max_ms),
        );

    let report = crawl_catalog(
        &extractor,
        &sources,
        Duration::from_millis(config.scraper_model_delay_ms),
        &TracingSink,
    )
    .await;

    if report.records.is_empty() {
        anyhow::bail!(
            "no component was extracted from {} source(s)",
            sources.len()
        );
    }
    for label in report.empty_models() {
        tracing::warn!(model = label, "source produced no components");
    }

    let priced = RepricingEngine::new(params).apply(&report.records);
    let exporter = Exporter::new(export_options(args));

    if let Some(limit) = args.preview {
        print_preview(&exporter, &priced, limit);
    }

    let csv = exporter
        .serialize(&priced)
        .context("failed to serialize export")?
        .context("nothing to export")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, csv.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                records = priced.len(),
                "export written"
            );
        }
        None => print!("{csv}"),
    }

    Ok(())
}

fn print_preview(exporter: &Exporter, priced: &[PricedRecord], limit: usize) {
    let Some(table) = exporter.table(priced) else {
        return;
    };
    eprintln!("{}", table.header.join(" | "));
    for row in table.rows.iter().take(limit) {
        eprintln!("{}", row.join(" | "));
    }
    if table.rows.len() > limit {
        eprintln!("... {} more row(s)", table.rows.len() - limit);
    }
}
