//! Read-only report of per-series missing-image counts. Operators run this
//! periodically to spot series that need an image pass.

use anyhow::{Context, Result};
use clap::Parser;
use tcg_catalog::catalog::cards::missing_image_counts;
use tcg_catalog::catalog::db::Db;
use tcg_catalog::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "media_audit", version, about = "Report cards missing artwork, by series")]
struct Cli {
    /// Optional override for the database URL
    #[arg(long)]
    db_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tcg_catalog::tracing::init_tracing("info,sqlx=warn")?;
    env_util::init_env();
    let cli = Cli::parse();

    let _ = env_util::preflight_check("media-audit", &[], &["DATABASE_URL", "RUST_LOG"]);

    let db_url = match &cli.db_url {
        Some(u) => u.clone(),
        None => env_util::db_url().context("set DATABASE_URL (or pass --db-url)")?,
    };
    let db = Db::connect_no_migrate(&db_url, 1).await?;

    let counts = missing_image_counts(&db).await?;
    if counts.is_empty() {
        println!("no cards missing artwork");
        return Ok(());
    }
    let mut total = 0i64;
    println!("{:<12} {:<8} missing", "tcg", "series");
    for (tcg_slug, series_code, missing) in counts {
        println!("{tcg_slug:<12} {series_code:<8} {missing}");
        total += missing;
    }
    println!("total: {total}");
    Ok(())
}
