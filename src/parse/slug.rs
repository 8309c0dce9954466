//! Slug/filename parsing into structured card identifiers.
//!
//! Source sites encode card identity in URL slugs with a handful of layouts
//! (`{lang}-{series}-{num}-{rarity}-{name}`, promo forms, rarity-less forms).
//! The cascade below is an explicit ordered pattern list; patterns are tried
//! top to bottom and the first match wins. A slug matching none of them is
//! `None` for the caller to log and skip; the parser never guesses.

use std::sync::OnceLock;

use regex::Regex;

use super::number::format_card_number;
use super::variant::{detect_variant, VariantTag};

/// Structured identity parsed out of one source slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdent {
    /// Series/set code, uppercased ("OP02", "P").
    pub series_code: String,
    /// Collector number exactly as printed in the slug ("004", "029").
    pub number: String,
    /// Uppercased rarity token when the slug carries one ("SR").
    pub rarity_code: Option<String>,
    /// Print-treatment tag detected from the name fragment.
    pub variant: Option<VariantTag>,
    /// Language code when the slug carries one; otherwise the caller's
    /// language context applies.
    pub language: Option<String>,
    /// Residual slug text after the structured fields (the card name part).
    pub name_fragment: String,
}

impl CardIdent {
    /// Collector number as stored in the database: the base number plus the
    /// variant suffix when a print treatment was detected ("004-ALT").
    pub fn db_number(&self) -> String {
        match self.variant {
            Some(tag) => format!("{}-{}", self.number, tag.as_str()),
            None => self.number.clone(),
        }
    }
}

// Token alternations shared by the patterns. Rarity tokens are a fixed set so
// a four-letter name word ("zoro") can never be mistaken for a rarity.
const LANG_TOKENS: &str = "en|fr|de|es|it|pt|jp|ja|ko|zh|cn";
const RARITY_TOKENS: &str = "uc|ssr|sec|sar|sr|rr|ar|ur|tr|sp|c|r|l|p";
const SERIES_TOKEN: &str = r"[a-z]{1,5}\d{1,3}";

struct SlugPattern {
    /// Identifies the layout in logs and tests.
    name: &'static str,
    regex: Regex,
    /// Series code to use when the layout implies one (promo forms).
    series_literal: Option<&'static str>,
}

fn patterns() -> &'static [SlugPattern] {
    static PATTERNS: OnceLock<Vec<SlugPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Order matters: most constrained layouts first, so a promo slug is
        // never consumed by the generic series layout.
        vec![
            SlugPattern {
                name: "lang-series-num-rarity-name",
                regex: Regex::new(&format!(
                    r"^(?P<lang>{LANG_TOKENS})-(?P<series>{SERIES_TOKEN})-(?P<num>\d{{1,3}})-(?P<rarity>{RARITY_TOKENS})-(?P<rest>.+)$"
                ))
                .unwrap(),
                series_literal: None,
            },
            SlugPattern {
                name: "promo-lang-num-name",
                regex: Regex::new(&format!(
                    r"^p-(?P<lang>{LANG_TOKENS})-(?P<num>\d{{1,3}})(?:-(?P<rest>.+))?$"
                ))
                .unwrap(),
                series_literal: Some("P"),
            },
            SlugPattern {
                name: "series-num-rarity-name",
                regex: Regex::new(&format!(
                    r"^(?P<series>{SERIES_TOKEN})-(?P<num>\d{{1,3}})-(?P<rarity>{RARITY_TOKENS})-(?P<rest>.+)$"
                ))
                .unwrap(),
                series_literal: None,
            },
            SlugPattern {
                name: "lang-series-num-name",
                regex: Regex::new(&format!(
                    r"^(?P<lang>{LANG_TOKENS})-(?P<series>{SERIES_TOKEN})-(?P<num>\d{{1,3}})(?:-(?P<rest>.+))?$"
                ))
                .unwrap(),
                series_literal: None,
            },
            SlugPattern {
                name: "series-num-name",
                regex: Regex::new(&format!(
                    r"^(?P<series>{SERIES_TOKEN})-(?P<num>\d{{1,3}})(?:-(?P<rest>.+))?$"
                ))
                .unwrap(),
                series_literal: None,
            },
        ]
    })
}

/// Parse one slug against the cascade. First matching pattern wins; `None`
/// means no known layout matched and the item should be skipped.
pub fn parse_slug(slug: &str) -> Option<CardIdent> {
    let normalized = slug.trim().to_ascii_lowercase();
    for pat in patterns() {
        if let Some(caps) = pat.regex.captures(&normalized) {
            let series_code = match pat.series_literal {
                Some(lit) => lit.to_string(),
                None => caps["series"].to_ascii_uppercase(),
            };
            let number = format_card_number(&caps["num"]);
            let rarity_code = caps
                .name("rarity")
                .map(|m| m.as_str().to_ascii_uppercase());
            let language = caps.name("lang").map(|m| m.as_str().to_string());
            let name_fragment = caps
                .name("rest")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let variant = detect_variant(&name_fragment);
            tracing::debug!(
                pattern = pat.name,
                series = %series_code,
                number = %number,
                "slug matched"
            );
            return Some(CardIdent {
                series_code,
                number,
                rarity_code,
                variant,
                language,
                name_fragment,
            });
        }
    }
    None
}

/// Extract the parseable slug from a detail-page URL or image filename:
/// last path segment, query stripped, file extension stripped.
pub fn slug_from_url(url: &str) -> &str {
    let no_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = no_query.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
    match segment.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext, "webp" | "png" | "jpg" | "jpeg" | "html") => stem,
        _ => segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lang_prefixed_slug_with_variant() {
        let ident = parse_slug("en-op02-004-sr-prb01-alternative-art-edward-newgate").unwrap();
        assert_eq!(ident.series_code, "OP02");
        assert_eq!(ident.number, "004");
        assert_eq!(ident.rarity_code.as_deref(), Some("SR"));
        assert_eq!(ident.variant, Some(VariantTag::Alt));
        assert_eq!(ident.language.as_deref(), Some("en"));
    }

    #[test]
    fn parses_promo_slug() {
        let ident = parse_slug("p-fr-029-monkey-d-luffy").unwrap();
        assert_eq!(ident.series_code, "P");
        assert_eq!(ident.number, "029");
        assert_eq!(ident.rarity_code, None);
        assert_eq!(ident.language.as_deref(), Some("fr"));
    }

    #[test]
    fn parses_slug_without_language_prefix() {
        let ident = parse_slug("op05-119-sec-im").unwrap();
        assert_eq!(ident.series_code, "OP05");
        assert_eq!(ident.number, "119");
        assert_eq!(ident.rarity_code.as_deref(), Some("SEC"));
        assert_eq!(ident.language, None);
    }

    #[test]
    fn name_word_is_not_mistaken_for_rarity() {
        // "zoro" is 4 letters but not a rarity token; the rarity-less layout wins.
        let ident = parse_slug("op01-025-zoro-the-pirate-hunter").unwrap();
        assert_eq!(ident.rarity_code, None);
        assert!(ident.name_fragment.starts_with("zoro"));
    }

    #[test]
    fn unknown_layout_is_none() {
        assert_eq!(parse_slug("completely-unstructured-text"), None);
        assert_eq!(parse_slug(""), None);
    }

    #[test]
    fn slug_from_url_strips_path_and_extension() {
        assert_eq!(
            slug_from_url("https://example.com/cards/en-op02-004-sr-foo.webp?v=2"),
            "en-op02-004-sr-foo"
        );
        assert_eq!(slug_from_url("/serie/op12/en-op12-001-l-luffy"), "en-op12-001-l-luffy");
    }
}
