//! The per-series ingestion orchestrator.
//!
//! Discovery -> parse -> normalize -> image -> upsert -> checkpoint, one
//! item at a time with fixed pacing between network calls. Every stage takes
//! its clients as injected dependencies so the whole pipeline runs against
//! fakes in tests and against live services in the bins.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::catalog::cards::{sibling_image_language, upsert_card, CardRecord};
use crate::catalog::db::Db;
use crate::catalog::series::{ensure_series, ensure_tcg_game, update_series_counts, SeriesMeta};
use crate::checkpoint::{Checkpoint, ItemOutcome};
use crate::fetch::client::pace;
use crate::fetch::detail::resolve_detail;
use crate::fetch::listing::collect_candidates;
use crate::images::pipeline::{materialize_card_image, ImageTarget};
use crate::images::storage::StorageClient;
use crate::normalize::{apply_corrections, normalize_rarity};
use crate::parse::slug::{parse_slug, slug_from_url};
use crate::source::SourceConfig;

/// CLI-facing knobs, one field per flag.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Report only; no database, storage or checkpoint writes.
    pub dry_run: bool,
    pub series: String,
    pub lang: String,
    /// Cap on discovered items, for testing.
    pub limit: Option<usize>,
    /// Keep going past a failed database write.
    pub continue_on_error: bool,
    /// Data-only pass; leave image fields untouched.
    pub skip_images: bool,
    pub checkpoint_path: PathBuf,
}

/// Final per-run accounting, logged once at the end.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub discovered: usize,
    pub ingested: u64,
    pub skipped: u64,
    pub parse_failures: u64,
    pub fetch_errors: u64,
    pub image_errors: u64,
    pub db_errors: u64,
}

impl RunSummary {
    pub fn log(&self, series: &str, lang: &str) {
        info!(
            series,
            lang,
            discovered = self.discovered,
            ingested = self.ingested,
            skipped = self.skipped,
            parse_failures = self.parse_failures,
            fetch_errors = self.fetch_errors,
            image_errors = self.image_errors,
            db_errors = self.db_errors,
            "ingest run finished"
        );
    }
}

/// One series/language ingestion with injected collaborators.
pub struct SeriesIngestor<'a> {
    pub db: &'a Db,
    pub http: &'a Client,
    pub storage: Option<&'a StorageClient>,
    pub source: &'a SourceConfig,
}

/// Fetch a series banner, normalize it onto the canvas and point
/// `series.image_url` at the stored object.
pub async fn ingest_series_banner(
    db: &Db,
    http: &Client,
    storage: &StorageClient,
    cfg: &SourceConfig,
    series_code: &str,
    banner_url: &str,
) -> Result<String> {
    use crate::fetch::client::get_bytes;
    use crate::images::storage::series_banner_path;
    use crate::images::transcode::{transcode_card, Fit};

    let game_id = ensure_tcg_game(db, cfg.tcg).await?;
    let series_id = ensure_series(db, game_id, series_code, &SeriesMeta::default()).await?;

    let referer = cfg.referer_required.then_some(cfg.base_url.as_str());
    let raw = get_bytes(http, banner_url, referer).await?;
    // Banners are landscape; letterbox instead of cropping.
    let encoded = transcode_card(&raw, Fit::Contain)?;
    let path = series_banner_path(series_code);
    storage
        .upload(&cfg.bucket, &path, encoded, "image/jpeg")
        .await?;
    let url = storage.public_url(&cfg.bucket, &path);
    crate::catalog::series::set_series_banner(db, series_id, &url).await?;
    info!(series = %series_code, %url, "series banner stored");
    Ok(url)
}

/// Fallback display name built from the slug's residual text:
/// "edward-newgate" -> "Edward Newgate".
fn name_from_fragment(fragment: &str) -> String {
    fragment
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl SeriesIngestor<'_> {
    pub async fn run(&self, opts: &IngestOptions) -> Result<RunSummary> {
        let cfg = self.source;
        let tcg = cfg.tcg;
        let mut summary = RunSummary::default();

        let mut checkpoint = Checkpoint::load_or_new(&opts.checkpoint_path)?;

        let scan = collect_candidates(
            self.http,
            cfg,
            &opts.series,
            &opts.lang,
            opts.limit,
        )
        .await
        .with_context(|| format!("listing discovery for {}", opts.series))?;
        summary.discovered = scan.candidates.len();
        info!(
            series = %opts.series,
            lang = %opts.lang,
            discovered = summary.discovered,
            advertised = ?scan.advertised_total,
            stopped_short = scan.stopped_short,
            dry_run = opts.dry_run,
            "discovery complete"
        );

        // Series resolution happens once; every card of the run reuses the id.
        let series_id = if opts.dry_run {
            None
        } else {
            let game_id = ensure_tcg_game(self.db, tcg).await?;
            let id = ensure_series(self.db, game_id, &opts.series, &SeriesMeta::default()).await?;
            if let Some(total) = scan.advertised_total {
                update_series_counts(self.db, id, None, Some(total as i32)).await?;
            }
            Some(id)
        };

        for (idx, candidate) in scan.candidates.iter().enumerate() {
            if idx > 0 {
                pace(cfg.detail_delay_ms).await;
            }
            let key = candidate.detail_url.as_str();
            if checkpoint.contains(key) {
                summary.skipped += 1;
                continue;
            }

            let slug = slug_from_url(key);
            let Some(ident) = parse_slug(slug) else {
                warn!(slug, "no slug pattern matched; skipping");
                summary.parse_failures += 1;
                if !opts.dry_run {
                    checkpoint.record(key, ItemOutcome::NotFound)?;
                }
                continue;
            };
            let language = ident
                .language
                .clone()
                .unwrap_or_else(|| opts.lang.clone());
            let db_number = ident.db_number();

            let detail = match resolve_detail(self.http, cfg, key, &language).await {
                Ok(d) => d,
                Err(e) => {
                    warn!(url = key, error = %e, "detail fetch failed; skipping item");
                    summary.fetch_errors += 1;
                    if !opts.dry_run {
                        checkpoint.record(key, ItemOutcome::Error)?;
                    }
                    continue;
                }
            };

            let rarity_raw = detail
                .rarity_raw
                .clone()
                .or_else(|| ident.rarity_code.clone());
            let rarity = rarity_raw.map(|r| normalize_rarity(tcg, &r));
            let name = apply_corrections(
                tcg,
                &detail
                    .name
                    .clone()
                    .unwrap_or_else(|| name_from_fragment(&ident.name_fragment)),
            );

            if opts.dry_run {
                info!(
                    series = %ident.series_code,
                    number = %db_number,
                    lang = %language,
                    name = %name,
                    rarity = ?rarity,
                    image = ?detail.image_url,
                    "dry-run: would upsert"
                );
                summary.ingested += 1;
                continue;
            }
            let series_id = series_id.expect("series resolved for non-dry runs");

            // Image first: a storage failure must leave the row's image
            // pointer unset, so the upsert below only carries a URL that is
            // actually materialized.
            let mut image_url: Option<String> = None;
            if !opts.skip_images {
                let storage = self
                    .storage
                    .context("storage client required unless --skip-images")?;
                let sibling =
                    sibling_image_language(self.db, series_id, &db_number, &language).await?;
                let target = ImageTarget {
                    series_code: ident.series_code.clone(),
                    language: language.clone(),
                    number: ident.number.clone(),
                    variant: ident.variant,
                };
                match materialize_card_image(
                    self.http,
                    storage,
                    cfg,
                    &target,
                    detail.image_url.as_deref(),
                    sibling.as_deref(),
                )
                .await
                {
                    Ok((url, outcome)) => {
                        info!(number = %db_number, outcome = ?outcome, "artwork materialized");
                        image_url = Some(url);
                    }
                    Err(e) => {
                        warn!(number = %db_number, error = %e, "artwork failed; row keeps no image");
                        summary.image_errors += 1;
                        checkpoint.record(key, ItemOutcome::Error)?;
                        continue;
                    }
                }
            }

            let record = CardRecord {
                series_id,
                number: db_number.clone(),
                name,
                language: language.clone(),
                rarity,
                image_url,
                attributes: Value::Object(detail.attributes.clone()),
            };
            match upsert_card(self.db, &record).await {
                Ok(_) => {
                    summary.ingested += 1;
                    checkpoint.record(key, ItemOutcome::Success)?;
                }
                Err(e) => {
                    summary.db_errors += 1;
                    error!(number = %db_number, error = %e, "card upsert failed");
                    checkpoint.record(key, ItemOutcome::Error)?;
                    if !opts.continue_on_error {
                        // Flush so the failure point is resumable, then abort.
                        checkpoint.save()?;
                        summary.log(&opts.series, &opts.lang);
                        return Err(e);
                    }
                }
            }
        }

        if !opts.dry_run {
            checkpoint.finish()?;
        }
        summary.log(&opts.series, &opts.lang);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_becomes_title_case_name() {
        assert_eq!(name_from_fragment("edward-newgate"), "Edward Newgate");
        assert_eq!(
            name_from_fragment("prb01-alternative-art-edward-newgate"),
            "Prb01 Alternative Art Edward Newgate"
        );
        assert_eq!(name_from_fragment(""), "");
    }
}
