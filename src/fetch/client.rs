//! Shared HTTP plumbing: client construction, fixed pacing, 429 backoff.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tokio::time::sleep;
use tracing::warn;

const USER_AGENT: &str = concat!("tcg-catalog/", env!("CARGO_PKG_VERSION"));

/// Backoff schedule applied only to HTTP 429 responses. Anything else fails
/// fast and is handled per-item by the caller.
const RETRY_DELAYS_SECS: [u64; 5] = [2, 4, 8, 16, 30];

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("building http client")
}

/// Fixed politeness delay between requests. Not a backoff mechanism.
pub async fn pace(ms: u64) {
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}

async fn get_with_backoff(
    client: &Client,
    url: &str,
    referer: Option<&str>,
) -> Result<reqwest::Response> {
    let mut attempt: usize = 0;
    loop {
        let mut req = client.get(url);
        if let Some(r) = referer {
            req = req.header("Referer", r);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if resp.status().as_u16() != 429 {
            if !resp.status().is_success() {
                bail!("GET {url} returned {}", resp.status());
            }
            return Ok(resp);
        }
        if attempt >= RETRY_DELAYS_SECS.len() {
            bail!("GET {url} rate limited after {} retries", attempt);
        }
        let mut sleep_secs = RETRY_DELAYS_SECS[attempt];
        if let Some(retry_after) = resp
            .headers()
            .get("Retry-After")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
        {
            if retry_after > sleep_secs {
                sleep_secs = retry_after;
            }
        }
        warn!(url, attempt, sleep_secs, "rate limited; backing off");
        attempt += 1;
        sleep(Duration::from_secs(sleep_secs)).await;
    }
}

/// GET a page body as text, retrying only on 429.
pub async fn get_html(client: &Client, url: &str, referer: Option<&str>) -> Result<String> {
    let resp = get_with_backoff(client, url, referer).await?;
    resp.text().await.with_context(|| format!("reading body of {url}"))
}

/// GET raw bytes (image downloads), retrying only on 429.
pub async fn get_bytes(client: &Client, url: &str, referer: Option<&str>) -> Result<Vec<u8>> {
    let resp = get_with_backoff(client, url, referer).await?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading bytes of {url}"))?;
    Ok(bytes.to_vec())
}
