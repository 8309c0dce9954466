//! Per-site source configuration records.
//!
//! Everything here is an external, volatile fact about a third-party site:
//! URL shapes, CSS selectors, pagination behavior, politeness delays. These
//! are data, not logic. The built-in defaults can be overridden from a JSON
//! file so selector rot is fixed without touching pipeline code.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::tcg::Tcg;

/// How a source exposes listing pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pagination {
    /// Stable page-number query parameter; safe to increment.
    QueryParam { param: String },
    /// The next-page target is only resolvable from the rendered document;
    /// the selector yields the anchor carrying the next listing URL.
    DomNext { selector: String },
}

/// Selectors applied to a card detail page.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailSelectors {
    /// Card display name.
    pub name: String,
    /// Rows of the attribute table; each row's first/last text node become
    /// the attribute key/value.
    pub attribute_rows: Option<String>,
    /// Raw rarity label, when the detail page carries one.
    pub rarity: Option<String>,
}

/// One scrape target: a TCG on a specific source site.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub tcg: Tcg,
    /// Short site identifier used in logs and checkpoint file names.
    pub site: String,
    pub base_url: String,
    /// Listing URL template; `{series}` and `{lang}` are substituted.
    pub listing_path: String,
    pub pagination: Pagination,
    /// Anchors pointing at card detail pages inside a listing document.
    pub card_link_selector: String,
    /// Only hrefs containing this fragment are card links (listing pages mix
    /// in navigation anchors).
    pub card_link_filter: Option<String>,
    /// Element whose text carries the source-advertised total item count.
    pub total_count_selector: Option<String>,
    pub detail: DetailSelectors,
    /// Source blocks hotlinked image fetches unless a Referer is sent.
    #[serde(default)]
    pub referer_required: bool,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,
    /// Object-storage bucket for this TCG's artwork.
    pub bucket: String,
}

fn default_page_delay_ms() -> u64 {
    1200
}

fn default_detail_delay_ms() -> u64 {
    400
}

impl SourceConfig {
    /// Listing URL for a series/language pair (page 1; pagination appends).
    pub fn listing_url(&self, series_code: &str, lang: &str) -> String {
        let path = self
            .listing_path
            .replace("{series}", &series_code.to_ascii_lowercase())
            .replace("{lang}", lang);
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// The configured scrape targets, one per TCG by default.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
}

impl SourceRegistry {
    /// Built-in defaults for the seven supported TCGs.
    pub fn builtin() -> Self {
        let raw = include_str!("../config/sources.json");
        let sources: Vec<SourceConfig> =
            serde_json::from_str(raw).expect("bundled config/sources.json is valid");
        Self { sources }
    }

    /// Load overrides from a JSON file (same schema as the bundled defaults).
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading source config {}", path.display()))?;
        let sources: Vec<SourceConfig> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing source config {}", path.display()))?;
        Ok(Self { sources })
    }

    pub fn for_tcg(&self, tcg: Tcg) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.tcg == tcg)
    }

    pub fn all(&self) -> &[SourceConfig] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_cover_every_tcg() {
        let reg = SourceRegistry::builtin();
        for tcg in Tcg::ALL {
            assert!(reg.for_tcg(tcg).is_some(), "no source config for {tcg}");
        }
    }

    #[test]
    fn listing_url_substitutes_series_and_lang() {
        let reg = SourceRegistry::builtin();
        let src = reg.for_tcg(Tcg::OnePiece).unwrap();
        let url = src.listing_url("OP12", "en");
        assert!(url.contains("op12"), "series not substituted: {url}");
        assert!(!url.contains("{lang}"), "lang not substituted: {url}");
    }
}
