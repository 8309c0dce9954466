use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tcg_catalog::catalog::db::Db;
use tcg_catalog::fetch::client::build_client;
use tcg_catalog::images::storage::StorageClient;
use tcg_catalog::pipeline::{IngestOptions, SeriesIngestor};
use tcg_catalog::source::SourceRegistry;
use tcg_catalog::tcg::Tcg;
use tcg_catalog::util::env as env_util;

/// Scrape one series/language from the configured source site and upsert the
/// cards into the catalog.
#[derive(Parser, Debug)]
#[command(name = "ingest", version, about = "Card catalog ingestion CLI")]
struct Cli {
    /// Which TCG's source to scrape
    #[arg(long, value_enum)]
    tcg: Tcg,
    /// Series code to ingest (e.g. OP12)
    #[arg(long)]
    series: String,
    /// Language to ingest
    #[arg(long, default_value = "en")]
    lang: String,
    /// Cap the number of items processed (testing)
    #[arg(long)]
    limit: Option<usize>,
    /// Report only; no database, storage or checkpoint writes
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Keep going past a failed database write
    #[arg(long, default_value_t = false)]
    continue_on_error: bool,
    /// Data-only pass; leave image fields untouched
    #[arg(long, default_value_t = false)]
    skip_images: bool,
    /// Override the bundled source configuration with a JSON file
    #[arg(long)]
    sources: Option<PathBuf>,
    /// Fetch this URL as the series banner before ingesting cards
    #[arg(long)]
    series_banner: Option<String>,
    /// Override the checkpoint file path
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Optional override for the database URL
    #[arg(long)]
    db_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tcg_catalog::tracing::init_tracing("info,sqlx=warn")?;
    env_util::init_env();
    let cli = Cli::parse();

    env_util::preflight_check("ingest", &[], &["DATABASE_URL", "SUPABASE_URL", "RUST_LOG"])?;

    let registry = match &cli.sources {
        Some(path) => SourceRegistry::load_file(path)?,
        None => SourceRegistry::builtin(),
    };
    let source = registry
        .for_tcg(cli.tcg)
        .ok_or_else(|| anyhow!("no source configured for {}", cli.tcg))?
        .clone();

    let checkpoint_path = cli.checkpoint.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "ingest_{}_{}_{}.json",
            source.site,
            cli.series.to_ascii_lowercase(),
            cli.lang
        ))
    });

    let db_url = match &cli.db_url {
        Some(u) => u.clone(),
        None => env_util::db_url().context("set DATABASE_URL (or pass --db-url)")?,
    };
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNECTIONS", 5);
    let db = Db::connect(&db_url, max_connections).await?;
    let http = build_client()?;

    // Storage is only touched when we actually materialize images.
    let storage = if cli.dry_run || cli.skip_images {
        None
    } else {
        Some(StorageClient::from_env(http.clone()).context(
            "set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY (or pass --skip-images)",
        )?)
    };

    if let Some(banner_url) = &cli.series_banner {
        match (&storage, cli.dry_run) {
            (Some(storage), false) => {
                tcg_catalog::pipeline::ingest_series_banner(
                    &db,
                    &http,
                    storage,
                    &source,
                    &cli.series.to_ascii_uppercase(),
                    banner_url,
                )
                .await?;
            }
            _ => println!("skipping series banner (dry-run or --skip-images)"),
        }
    }

    let opts = IngestOptions {
        dry_run: cli.dry_run,
        series: cli.series.to_ascii_uppercase(),
        lang: cli.lang.clone(),
        limit: cli.limit,
        continue_on_error: cli.continue_on_error,
        skip_images: cli.skip_images,
        checkpoint_path,
    };

    let ingestor = SeriesIngestor {
        db: &db,
        http: &http,
        storage: storage.as_ref(),
        source: &source,
    };
    let summary = ingestor.run(&opts).await?;

    println!(
        "ingest {} {} [{}]: discovered={} ingested={} skipped={} parse_failures={} fetch_errors={} image_errors={} db_errors={}{}",
        source.site,
        opts.series,
        opts.lang,
        summary.discovered,
        summary.ingested,
        summary.skipped,
        summary.parse_failures,
        summary.fetch_errors,
        summary.image_errors,
        summary.db_errors,
        if cli.dry_run { " (dry-run)" } else { "" }
    );
    Ok(())
}
