//! Card row persistence: conflict-safe upsert keyed on
//! `(series_id, number, language)`, image pointer updates, and the batched
//! queries the backfill/audit bins page through.

use anyhow::Result;
use serde_json::Value;
use sqlx::Row;

use super::db::Db;

/// One fully normalized card ready to persist.
#[derive(Debug, Clone)]
pub struct CardRecord {
    pub series_id: i64,
    /// Collector number, possibly variant-suffixed ("004-ALT", "1/P3").
    pub number: String,
    pub name: String,
    pub language: String,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    /// Per-TCG open fields (cost/power/domains/illustrator/...).
    pub attributes: Value,
}

/// Insert-or-update one card. On conflict the mutable fields are updated in
/// place; the image pointer is only ever improved, never cleared by a pass
/// that didn't materialize an image.
pub async fn upsert_card(db: &Db, card: &CardRecord) -> Result<i64> {
    let row = sqlx::query(
        "INSERT INTO cards (series_id, number, name, language, rarity, image_url, attributes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (series_id, number, language)
         DO UPDATE SET name = EXCLUDED.name,
                       rarity = COALESCE(EXCLUDED.rarity, cards.rarity),
                       image_url = COALESCE(EXCLUDED.image_url, cards.image_url),
                       attributes = EXCLUDED.attributes
         RETURNING id",
    )
    .persistent(false)
    .bind(card.series_id)
    .bind(&card.number)
    .bind(&card.name)
    .bind(&card.language)
    .bind(card.rarity.as_deref())
    .bind(card.image_url.as_deref())
    .bind(&card.attributes)
    .fetch_one(&db.pool)
    .await?;
    Ok(row.get("id"))
}

/// Point one card at its stored artwork.
pub async fn set_card_image(db: &Db, card_id: i64, image_url: &str) -> Result<()> {
    sqlx::query("UPDATE cards SET image_url = $2 WHERE id = $1")
        .persistent(false)
        .bind(card_id)
        .bind(image_url)
        .execute(&db.pool)
        .await?;
    Ok(())
}

/// A sibling row: same `(series, number)` in another language that already
/// has stored artwork. Presence of one makes the copy path preferable to a
/// fresh download.
pub async fn sibling_image_language(
    db: &Db,
    series_id: i64,
    number: &str,
    language: &str,
) -> Result<Option<String>> {
    let row = sqlx::query(
        "SELECT language FROM cards
         WHERE series_id = $1 AND number = $2 AND language <> $3
           AND image_url IS NOT NULL
         ORDER BY CASE WHEN language = 'en' THEN 0 ELSE 1 END, language
         LIMIT 1",
    )
    .persistent(false)
    .bind(series_id)
    .bind(number)
    .bind(language)
    .fetch_optional(&db.pool)
    .await?;
    Ok(row.map(|r| r.get("language")))
}

/// One row of the image-backfill work list.
#[derive(Debug, Clone)]
pub struct MissingImageCard {
    pub id: i64,
    pub series_id: i64,
    pub series_code: String,
    pub tcg_slug: String,
    pub number: String,
    pub language: String,
}

/// Page through cards with no stored artwork. Keyset pagination (`id >
/// after_id`) in fixed-size batches; large ID lists never travel in one
/// query.
pub async fn cards_missing_image(
    db: &Db,
    series_code: Option<&str>,
    language: Option<&str>,
    after_id: i64,
    batch: i64,
) -> Result<Vec<MissingImageCard>> {
    let rows = sqlx::query(
        "SELECT c.id, c.series_id, s.code AS series_code, g.slug AS tcg_slug,
                c.number, c.language
         FROM cards c
         JOIN series s ON s.id = c.series_id
         JOIN tcg_games g ON g.id = s.tcg_game_id
         WHERE c.image_url IS NULL
           AND c.id > $1
           AND ($2::text IS NULL OR s.code = $2)
           AND ($3::text IS NULL OR c.language = $3)
         ORDER BY c.id
         LIMIT $4",
    )
    .persistent(false)
    .bind(after_id)
    .bind(series_code)
    .bind(language)
    .bind(batch)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| MissingImageCard {
            id: r.get("id"),
            series_id: r.get("series_id"),
            series_code: r.get("series_code"),
            tcg_slug: r.get("tcg_slug"),
            number: r.get("number"),
            language: r.get("language"),
        })
        .collect())
}

/// Per-series missing-image counts for the audit bin.
pub async fn missing_image_counts(db: &Db) -> Result<Vec<(String, String, i64)>> {
    let rows = sqlx::query(
        "SELECT g.slug AS tcg_slug, s.code AS series_code, COUNT(*) AS missing
         FROM cards c
         JOIN series s ON s.id = c.series_id
         JOIN tcg_games g ON g.id = s.tcg_game_id
         WHERE c.image_url IS NULL
         GROUP BY g.slug, s.code
         ORDER BY g.slug, s.code",
    )
    .persistent(false)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.get("tcg_slug"), r.get("series_code"), r.get("missing")))
        .collect())
}
