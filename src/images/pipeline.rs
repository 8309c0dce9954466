//! Materializes card artwork into object storage.
//!
//! Two paths exist: download-and-transcode from the source site, or a
//! storage-to-storage copy when another language of the identical card
//! already has the artwork. The copy path skips the network entirely, which
//! is the dominant cost for TCGs whose localizations share art.

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::parse::variant::VariantTag;
use crate::source::SourceConfig;

use super::storage::{card_object_path, StorageClient};
use super::transcode::transcode_card_auto;
use crate::fetch::client::get_bytes;

/// Identity of the artwork slot being materialized.
#[derive(Debug, Clone)]
pub struct ImageTarget {
    pub series_code: String,
    pub language: String,
    pub number: String,
    pub variant: Option<VariantTag>,
}

impl ImageTarget {
    pub fn object_path(&self) -> String {
        card_object_path(
            &self.series_code,
            &self.language,
            &self.number,
            self.variant,
        )
    }
}

/// How the artwork got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Server-side copy from a sibling language's stored object.
    Copied { from_language: String },
    /// Fetched from the source, transcoded and uploaded.
    Downloaded,
}

/// The resolution a materialization will take, decided before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePlan<'a> {
    /// Sibling language already holds the artwork; server-side copy.
    CopyFrom { language: &'a str },
    /// No stored sibling; fetch from the source site.
    Download { url: &'a str },
}

/// Copy beats download whenever a sibling language's artwork is stored.
pub fn plan_image<'a>(
    source_image_url: Option<&'a str>,
    sibling_language: Option<&'a str>,
) -> Result<ImagePlan<'a>> {
    if let Some(language) = sibling_language {
        return Ok(ImagePlan::CopyFrom { language });
    }
    let url = source_image_url.context("no source image url and no sibling artwork to copy")?;
    Ok(ImagePlan::Download { url })
}

/// Ensure the target's artwork exists in storage and return its public URL.
///
/// Preference order: copy from a sibling language when one is known to have
/// the identical artwork stored, otherwise download from `source_image_url`.
/// On any failure nothing is partially written; the caller leaves the card
/// row's image field untouched.
pub async fn materialize_card_image(
    http: &Client,
    storage: &StorageClient,
    cfg: &SourceConfig,
    target: &ImageTarget,
    source_image_url: Option<&str>,
    sibling_language: Option<&str>,
) -> Result<(String, ImageOutcome)> {
    let dest = target.object_path();

    match plan_image(source_image_url, sibling_language)? {
        ImagePlan::CopyFrom { language } => {
            let src = card_object_path(
                &target.series_code,
                language,
                &target.number,
                target.variant,
            );
            storage.copy_object(&cfg.bucket, &src, &dest).await?;
            info!(
                bucket = %cfg.bucket,
                from = %src,
                to = %dest,
                "reused sibling-language artwork"
            );
            Ok((
                storage.public_url(&cfg.bucket, &dest),
                ImageOutcome::Copied {
                    from_language: language.to_string(),
                },
            ))
        }
        ImagePlan::Download { url } => {
            let referer = cfg.referer_required.then_some(cfg.base_url.as_str());
            let raw = get_bytes(http, url, referer).await?;
            let encoded = transcode_card_auto(&raw)?;
            debug!(url, bytes_in = raw.len(), bytes_out = encoded.len(), "transcoded");
            storage
                .upload(&cfg.bucket, &dest, encoded, "image/jpeg")
                .await?;
            Ok((
                storage.public_url(&cfg.bucket, &dest),
                ImageOutcome::Downloaded,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_path_lands_in_own_language_folder() {
        let t = ImageTarget {
            series_code: "OP02".into(),
            language: "fr".into(),
            number: "4".into(),
            variant: None,
        };
        assert_eq!(t.object_path(), "OP02/fr/004.jpg");
    }

    #[test]
    fn sibling_artwork_beats_download() {
        let plan = plan_image(Some("https://src.example/img.webp"), Some("en")).unwrap();
        assert_eq!(plan, ImagePlan::CopyFrom { language: "en" });
    }

    #[test]
    fn download_when_no_sibling() {
        let plan = plan_image(Some("https://src.example/img.webp"), None).unwrap();
        assert_eq!(
            plan,
            ImagePlan::Download {
                url: "https://src.example/img.webp"
            }
        );
    }

    #[test]
    fn neither_source_nor_sibling_is_an_error() {
        assert!(plan_image(None, None).is_err());
    }
}
