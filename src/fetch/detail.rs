//! Card detail-page extraction: display name, raw rarity, attributes and the
//! full-resolution image URL.
//!
//! Image resolution prefers the structured JSON-LD block over `og:image`:
//! shared multi-language pages list one image per localization in the JSON-LD
//! `image` array, and only the URL's language segment disambiguates them.

use anyhow::{anyhow, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::source::{DetailSelectors, SourceConfig};

use super::client::get_html;

/// Everything a detail page yields for one card.
#[derive(Debug, Default, Clone)]
pub struct DetailData {
    pub name: Option<String>,
    pub rarity_raw: Option<String>,
    pub attributes: serde_json::Map<String, Value>,
    pub image_url: Option<String>,
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid selector {raw:?}: {e}"))
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Pick the image for `lang` out of a JSON-LD `image` value (string or
/// array). Array entries are filtered by a `/{lang}/` or `{lang}-` URL
/// segment; when nothing matches the first entry wins.
fn image_from_jsonld(image: &Value, lang: &str) -> Option<String> {
    match image {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let urls: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            let seg = format!("/{lang}/");
            let prefix = format!("{lang}-");
            urls.iter()
                .find(|u| u.contains(&seg) || u.rsplit('/').next().is_some_and(|f| f.starts_with(&prefix)))
                .or_else(|| urls.first())
                .map(|s| s.to_string())
        }
        _ => None,
    }
}

/// Scan every JSON-LD script block for an object carrying an `image` field.
fn jsonld_image(doc: &Html, lang: &str) -> Option<String> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for script in doc.select(&sel) {
        let raw: String = script.text().collect();
        let Ok(parsed) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        // A block may be a single object or an array of them.
        let objects: Vec<&Value> = match &parsed {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for obj in objects {
            if let Some(img) = obj.get("image") {
                if let Some(url) = image_from_jsonld(img, lang) {
                    return Some(url);
                }
            }
        }
    }
    None
}

fn og_image(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[property="og:image"]"#).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(|s| s.to_string())
}

/// Pure extraction over one detail document.
pub fn extract_detail(html: &str, cfg: &DetailSelectors, lang: &str) -> Result<DetailData> {
    let doc = Html::parse_document(html);
    let mut out = DetailData::default();

    let name_sel = selector(&cfg.name)?;
    out.name = doc
        .select(&name_sel)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());

    if let Some(raw) = &cfg.rarity {
        let sel = selector(raw)?;
        out.rarity_raw = doc
            .select(&sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());
    }

    if let Some(rows_raw) = &cfg.attribute_rows {
        let rows_sel = selector(rows_raw)?;
        for row in doc.select(&rows_sel) {
            let cells: Vec<String> = row
                .children()
                .filter_map(scraper::ElementRef::wrap)
                .map(element_text)
                .filter(|s| !s.is_empty())
                .collect();
            if cells.len() >= 2 {
                let key = cells[0].trim_end_matches(':').trim().to_string();
                let val = cells[cells.len() - 1].clone();
                out.attributes.insert(key, Value::String(val));
            }
        }
    }

    out.image_url = jsonld_image(&doc, lang).or_else(|| og_image(&doc));

    Ok(out)
}

/// Fetch and extract one detail page. Any failure here is an error for this
/// item only; the caller logs, counts and moves on.
pub async fn resolve_detail(
    client: &Client,
    cfg: &SourceConfig,
    url: &str,
    lang: &str,
) -> Result<DetailData> {
    let html = get_html(client, url, None).await?;
    extract_detail(&html, &cfg.detail, lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceRegistry;
    use crate::tcg::Tcg;

    fn detail_cfg() -> DetailSelectors {
        SourceRegistry::builtin()
            .for_tcg(Tcg::OnePiece)
            .unwrap()
            .detail
            .clone()
    }

    const DETAIL: &str = r#"
        <html><head>
          <meta property="og:image" content="https://img.example/en-op02-004-sr.webp" />
          <script type="application/ld+json">
            {
              "@type": "Product",
              "name": "Edward Newgate",
              "image": [
                "https://img.example/cards/en/en-op02-004-sr.webp",
                "https://img.example/cards/fr/fr-op02-004-sr.webp"
              ]
            }
          </script>
        </head><body>
          <h1 class="card-name">Edward Newgate</h1>
          <span class="card-rarity">Super Rare</span>
          <table class="card-attributes">
            <tr><th>Cost:</th><td>9</td></tr>
            <tr><th>Power</th><td>10000</td></tr>
          </table>
        </body></html>"#;

    #[test]
    fn jsonld_beats_og_image_and_filters_language() {
        let data = extract_detail(DETAIL, &detail_cfg(), "fr").unwrap();
        assert_eq!(
            data.image_url.as_deref(),
            Some("https://img.example/cards/fr/fr-op02-004-sr.webp")
        );
    }

    #[test]
    fn falls_back_to_og_image() {
        let html = r#"
            <html><head>
              <meta property="og:image" content="https://img.example/x.webp" />
            </head><body><h1 class="card-name">X</h1></body></html>"#;
        let data = extract_detail(html, &detail_cfg(), "en").unwrap();
        assert_eq!(data.image_url.as_deref(), Some("https://img.example/x.webp"));
    }

    #[test]
    fn extracts_name_rarity_and_attributes() {
        let data = extract_detail(DETAIL, &detail_cfg(), "en").unwrap();
        assert_eq!(data.name.as_deref(), Some("Edward Newgate"));
        assert_eq!(data.rarity_raw.as_deref(), Some("Super Rare"));
        assert_eq!(data.attributes.get("Cost"), Some(&Value::String("9".into())));
        assert_eq!(
            data.attributes.get("Power"),
            Some(&Value::String("10000".into()))
        );
    }

    #[test]
    fn unmatched_language_takes_first_jsonld_entry() {
        let data = extract_detail(DETAIL, &detail_cfg(), "jp").unwrap();
        assert_eq!(
            data.image_url.as_deref(),
            Some("https://img.example/cards/en/en-op02-004-sr.webp")
        );
    }
}
