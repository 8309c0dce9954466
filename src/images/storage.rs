//! Object-storage client (Supabase Storage REST API).
//!
//! One bucket per TCG. All writes are keyed by deterministic paths and use
//! overwrite-if-exists semantics, so re-running ingestion after a partial
//! failure never produces duplicate or orphaned objects.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::json;

use crate::parse::number::pad_for_path;
use crate::parse::variant::VariantTag;
use crate::util::env::{env_req, env_opt};

const IMAGE_EXT: &str = "jpg";

/// Deterministic object path for one card's artwork:
/// `{seriesCode}/{language}/{paddedNumber}[-{variantTag}].jpg`.
pub fn card_object_path(
    series_code: &str,
    language: &str,
    number: &str,
    variant: Option<VariantTag>,
) -> String {
    let padded = pad_for_path(number);
    match variant {
        Some(tag) => format!("{series_code}/{language}/{padded}-{}.{IMAGE_EXT}", tag.as_str()),
        None => format!("{series_code}/{language}/{padded}.{IMAGE_EXT}"),
    }
}

/// Series banner path inside the TCG bucket: `series/{seriesCode}.jpg`.
pub fn series_banner_path(series_code: &str) -> String {
    format!("series/{series_code}.{IMAGE_EXT}")
}

#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    base_url: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(http: Client, base_url: &str, service_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Build from SUPABASE_URL + SUPABASE_SERVICE_ROLE_KEY (or SUPABASE_KEY).
    pub fn from_env(http: Client) -> Result<Self> {
        let base_url = env_req("SUPABASE_URL")?;
        let service_key = env_opt("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|| env_opt("SUPABASE_KEY"))
            .ok_or_else(|| anyhow::anyhow!("missing env var SUPABASE_SERVICE_ROLE_KEY"))?;
        Ok(Self::new(http, &base_url, &service_key))
    }

    /// Public (unauthenticated) URL for a stored object.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }

    /// Upload bytes at `path`, overwriting any existing object.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("uploading {bucket}/{path}"))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("storage upload {bucket}/{path} failed: {status} {body}");
        }
        Ok(())
    }

    /// Server-side copy within a bucket; no bytes travel through this process.
    pub async fn copy_object(&self, bucket: &str, from: &str, to: &str) -> Result<()> {
        let url = format!("{}/storage/v1/object/copy", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({
                "bucketId": bucket,
                "sourceKey": from,
                "destinationKey": to,
            }))
            .send()
            .await
            .with_context(|| format!("copying {bucket}/{from} -> {to}"))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        // The copy endpoint has no upsert flag. An existing destination holds
        // the same artwork (paths are deterministic), so a duplicate conflict
        // counts as materialized.
        if status.as_u16() == 409 {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        bail!("storage copy {bucket}/{from} -> {to} failed: {status} {body}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_paths_are_deterministic_and_padded() {
        assert_eq!(card_object_path("OP12", "fr", "4", None), "OP12/fr/004.jpg");
        assert_eq!(
            card_object_path("OP02", "en", "004", Some(VariantTag::Alt)),
            "OP02/en/004-ALT.jpg"
        );
    }

    #[test]
    fn promo_numbers_stay_single_segment() {
        let path = card_object_path("P", "fr", "1/P3", None);
        assert_eq!(path, "P/fr/1-P3.jpg");
        assert_eq!(path.matches('/').count(), 2);
    }

    #[test]
    fn banner_path_shape() {
        assert_eq!(series_banner_path("OP12"), "series/OP12.jpg");
    }

    #[test]
    fn public_url_shape() {
        let c = StorageClient::new(Client::new(), "https://proj.supabase.co/", "k");
        assert_eq!(
            c.public_url("onepiece", "OP12/fr/004.jpg"),
            "https://proj.supabase.co/storage/v1/object/public/onepiece/OP12/fr/004.jpg"
        );
    }
}
