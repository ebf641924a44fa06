mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;

/// Issues a GET for `url` with the given query pairs and decodes a JSON body.
///
/// # Errors
///
/// Fails on transport errors, non-2xx statuses (the body is included in the
/// message) and bodies that do not decode as `T`. Messages never contain the
/// request URL, which may carry a credential added by an [`auth`] wrapper.
pub async fn get_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T> {
    let mut url: reqwest::Url = url.parse()?;
    url.query_pairs_mut().extend_pairs(query);

    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e.without_url()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("HTTP {}: {}", status, body));
    }

    resp.json::<T>()
        .await
        .map_err(|e| anyhow!("Failed to parse response: {}", e.without_url()))
}
