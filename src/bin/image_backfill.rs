//! Populate `cards.image_url` for rows that missed their artwork pass.
//!
//! Only the storage-to-storage path runs here: a row whose sibling language
//! already has the artwork gets a server-side copy and a pointer update, no
//! network download. Rows with no sibling artwork are reported; they need a
//! full ingest pass with images enabled.

use anyhow::{Context, Result};
use clap::Parser;
use tcg_catalog::catalog::cards::{cards_missing_image, set_card_image, sibling_image_language};
use tcg_catalog::catalog::db::Db;
use tcg_catalog::fetch::client::build_client;
use tcg_catalog::images::storage::{card_object_path, StorageClient};
use tcg_catalog::tcg::Tcg;
use tcg_catalog::util::env as env_util;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "image_backfill", version, about = "Copy sibling-language artwork onto cards missing images")]
struct Cli {
    /// Restrict to one series code
    #[arg(long)]
    series: Option<String>,
    /// Restrict to one language
    #[arg(long)]
    lang: Option<String>,
    /// Cap on rows processed
    #[arg(long)]
    limit: Option<usize>,
    /// Rows fetched per batch
    #[arg(long, default_value_t = 500)]
    batch: i64,
    /// Report only; no storage or database writes
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Optional override for the database URL
    #[arg(long)]
    db_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tcg_catalog::tracing::init_tracing("info,sqlx=warn")?;
    env_util::init_env();
    let cli = Cli::parse();

    let _ = env_util::preflight_check(
        "image-backfill",
        &[],
        &["DATABASE_URL", "SUPABASE_URL", "RUST_LOG"],
    );

    let db_url = match &cli.db_url {
        Some(u) => u.clone(),
        None => env_util::db_url().context("set DATABASE_URL (or pass --db-url)")?,
    };
    let db = Db::connect_no_migrate(&db_url, 2).await?;
    let http = build_client()?;
    let storage = StorageClient::from_env(http)
        .context("set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY")?;

    let mut copied = 0usize;
    let mut no_sibling = 0usize;
    let mut errors = 0usize;
    let mut after_id = 0i64;

    'outer: loop {
        let rows = cards_missing_image(
            &db,
            cli.series.as_deref(),
            cli.lang.as_deref(),
            after_id,
            cli.batch,
        )
        .await?;
        if rows.is_empty() {
            break;
        }
        for card in rows {
            after_id = card.id;
            if let Some(cap) = cli.limit {
                if copied + no_sibling + errors >= cap {
                    break 'outer;
                }
            }

            let Some(tcg) = Tcg::from_slug(&card.tcg_slug) else {
                warn!(tcg = %card.tcg_slug, "unknown tcg slug; skipping");
                errors += 1;
                continue;
            };
            let bucket = tcg.slug();

            let sibling =
                sibling_image_language(&db, card.series_id, &card.number, &card.language).await?;
            let Some(sib_lang) = sibling else {
                no_sibling += 1;
                continue;
            };

            // Stored objects are keyed by the base number; strip a variant
            // suffix when the DB number carries one.
            let (base_number, variant) = split_variant(&card.number);
            let from = card_object_path(&card.series_code, &sib_lang, base_number, variant);
            let to = card_object_path(&card.series_code, &card.language, base_number, variant);

            if cli.dry_run {
                info!(card_id = card.id, %from, %to, "dry-run: would copy");
                copied += 1;
                continue;
            }
            if let Err(e) = storage.copy_object(bucket, &from, &to).await {
                warn!(card_id = card.id, error = %e, "storage copy failed");
                errors += 1;
                continue;
            }
            let url = storage.public_url(bucket, &to);
            if let Err(e) = set_card_image(&db, card.id, &url).await {
                warn!(card_id = card.id, error = %e, "image pointer update failed");
                errors += 1;
                continue;
            }
            copied += 1;
        }
    }

    println!(
        "image backfill complete: copied={copied}, no_sibling={no_sibling}, errors={errors}{}",
        if cli.dry_run { " (dry-run)" } else { "" }
    );
    if no_sibling > 0 {
        println!("{no_sibling} rows have no sibling artwork; re-run ingest with images enabled");
    }
    Ok(())
}

/// Split a DB collector number into base number and variant tag
/// ("004-ALT" -> ("004", Some(Alt))).
fn split_variant(number: &str) -> (&str, Option<tcg_catalog::parse::variant::VariantTag>) {
    use tcg_catalog::parse::variant::VariantTag;
    const TAGS: [VariantTag; 6] = [
        VariantTag::Alt,
        VariantTag::FullArt,
        VariantTag::FoilTextured,
        VariantTag::Parallel,
        VariantTag::Manga,
        VariantTag::V2,
    ];
    for tag in TAGS {
        if let Some(base) = number.strip_suffix(&format!("-{}", tag.as_str())) {
            return (base, Some(tag));
        }
    }
    (number, None)
}
