use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use assessment_recommender::{init_tracing, recommend, CatalogArgs, CatalogItem, Recommendation};
use clap::{Parser, ValueEnum};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "recommend-cli",
    about = "Rank catalog assessments against a query from the command line"
)]
struct RecommendCli {
    /// Free-text query to rank against product names.
    #[arg(long, short)]
    query: String,

    /// Maximum number of recommendations.
    #[arg(long, default_value_t = 10)]
    top_n: usize,

    /// Parse a saved catalog page instead of fetching the live one.
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(flatten)]
    catalog: CatalogArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = RecommendCli::parse();
    let extractor = cli
        .catalog
        .build_controls(cli.top_n, Duration::ZERO)
        .build_extractor()
        .context("invalid catalog configuration")?;

    let catalog = match &cli.html_file {
        Some(path) => {
            let html = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            extractor.parse(&html)
        }
        None => extractor.fetch().await,
    };
    if catalog.is_empty() {
        warn!("no catalog data available");
    }

    let recommendations = rank_catalog(&catalog, &cli.query, cli.top_n);
    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&recommendations)
                .context("failed to serialize recommendations")?;
            println!("{json}");
        }
        OutputFormat::Table => print_table(&recommendations),
    }
    Ok(())
}

fn rank_catalog(catalog: &[CatalogItem], query: &str, top_n: usize) -> Vec<Recommendation> {
    recommend(catalog, query, top_n)
        .iter()
        .map(Recommendation::from)
        .collect()
}

fn print_table(rows: &[Recommendation]) {
    println!("{:>7}  {:<6}  {:<8}  {:<40}  URL", "SCORE", "REMOTE", "ADAPTIVE", "NAME");
    for row in rows {
        println!(
            "{:>7.4}  {:<6}  {:<8}  {:<40}  {}",
            row.score,
            if row.remote { "yes" } else { "no" },
            if row.adaptive { "yes" } else { "no" },
            row.name,
            row.url
        );
    }
}
