//! TCG game and series resolution (create-if-absent).

use anyhow::Result;
use sqlx::Row;
use tracing::debug;

use crate::tcg::Tcg;

use super::db::Db;

/// Series-level metadata known at ingestion time. All optional; whatever the
/// source exposes gets written, the rest stays NULL until a later pass.
#[derive(Debug, Default, Clone)]
pub struct SeriesMeta {
    pub name: Option<String>,
    /// Count of non-promo cards in the set.
    pub max_set_base: Option<i32>,
    /// Count including foil/promo variants.
    pub master_set: Option<i32>,
    pub image_url: Option<String>,
}

/// Look up the `tcg_games` row by slug, inserting it on first contact.
pub async fn ensure_tcg_game(db: &Db, tcg: Tcg) -> Result<i64> {
    if let Some(r) = sqlx::query("SELECT id FROM tcg_games WHERE slug = $1")
        .persistent(false)
        .bind(tcg.slug())
        .fetch_optional(&db.pool)
        .await?
    {
        return Ok(r.get("id"));
    }
    let inserted = sqlx::query("INSERT INTO tcg_games (slug, name) VALUES ($1, $2) RETURNING id")
        .persistent(false)
        .bind(tcg.slug())
        .bind(tcg.display_name())
        .fetch_one(&db.pool)
        .await?;
    debug!(tcg = %tcg, "tcg_games row inserted");
    Ok(inserted.get("id"))
}

/// Resolve a series by `(tcg_game_id, code)`, inserting with whatever
/// metadata is available. The returned id is reused for every card of the
/// series in this run.
pub async fn ensure_series(
    db: &Db,
    tcg_game_id: i64,
    code: &str,
    meta: &SeriesMeta,
) -> Result<i64> {
    if let Some(r) = sqlx::query("SELECT id FROM series WHERE tcg_game_id = $1 AND code = $2")
        .persistent(false)
        .bind(tcg_game_id)
        .bind(code)
        .fetch_optional(&db.pool)
        .await?
    {
        return Ok(r.get("id"));
    }
    let inserted = sqlx::query(
        "INSERT INTO series (tcg_game_id, code, name, max_set_base, master_set, image_url)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .persistent(false)
    .bind(tcg_game_id)
    .bind(code)
    .bind(meta.name.as_deref().unwrap_or(code))
    .bind(meta.max_set_base)
    .bind(meta.master_set)
    .bind(meta.image_url.as_deref())
    .fetch_one(&db.pool)
    .await?;
    debug!(code, tcg_game_id, "series row inserted");
    Ok(inserted.get("id"))
}

/// Update card counts from a source-advertised total. Only fills what the
/// caller passes; existing values are kept when the argument is None.
pub async fn update_series_counts(
    db: &Db,
    series_id: i64,
    max_set_base: Option<i32>,
    master_set: Option<i32>,
) -> Result<()> {
    sqlx::query(
        "UPDATE series
         SET max_set_base = COALESCE($2, max_set_base),
             master_set = COALESCE($3, master_set)
         WHERE id = $1",
    )
    .persistent(false)
    .bind(series_id)
    .bind(max_set_base)
    .bind(master_set)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Point the series banner at a stored image.
pub async fn set_series_banner(db: &Db, series_id: i64, image_url: &str) -> Result<()> {
    sqlx::query("UPDATE series SET image_url = $2 WHERE id = $1")
        .persistent(false)
        .bind(series_id)
        .bind(image_url)
        .execute(&db.pool)
        .await?;
    Ok(())
}
