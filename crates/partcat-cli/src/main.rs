mod run;
mod sources;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "partcat")]
#[command(about = "Scrape, reprice and export a phone spare-part catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl every catalog source, reprice the components and export them
    Run(RunArgs),
    /// List the validated catalog sources without crawling
    Sources(SourceArgs),
}

/// Where catalog sources come from and which ones to keep.
#[derive(Debug, Args)]
pub(crate) struct SourceArgs {
    /// Catalog file with the site profile and sources [default: $PARTCAT_CATALOG_PATH]
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Semicolon-delimited `label;url` file appended to the catalog sources
    #[arg(long)]
    pub sources_csv: Option<PathBuf>,

    /// Only keep sources with this label (case-insensitive, repeatable)
    #[arg(long = "model")]
    pub models: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Write the CSV export to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Markup coefficient applied to the supplier price [default: $PARTCAT_MARKUP_COEFFICIENT]
    #[arg(long)]
    pub markup: Option<Decimal>,

    /// Fixed surcharge added after the markup [default: $PARTCAT_FIXED_SURCHARGE]
    #[arg(long)]
    pub surcharge: Option<Decimal>,

    /// Tax coefficient applied last [default: $PARTCAT_TAX_COEFFICIENT]
    #[arg(long)]
    pub tax: Option<Decimal>,

    /// Leave the scraped price text out of the export
    #[arg(long)]
    pub no_raw_price: bool,

    /// Prefix the CSV with a UTF-8 byte order mark
    #[arg(long)]
    pub bom: bool,

    /// Show the sources and pricing that would be used, without crawling
    #[arg(long)]
    pub dry_run: bool,

    /// Print the first N priced rows to stderr
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = partcat_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run::handle_run(&config, &args).await?,
        Commands::Sources(args) => sources::handle_sources(&config, &args)?,
    }

    Ok(())
}
