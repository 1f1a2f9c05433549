//! HTTP retrieval of feed documents.

use std::time::Duration;

use opensky_core::query::{self, BoundingBox};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned HTTP status {0}")]
    Status(u16),
    #[error("feed body is not valid UTF-8")]
    Utf8,
}

/// Fetches `states/all` documents from a configurable endpoint.
#[derive(Clone)]
pub struct FeedClient {
    base_url: String,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("opensky-fetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(FeedClient {
            base_url: base_url.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request URL for a bounding box on this client's endpoint.
    pub fn query_url(&self, bbox: &BoundingBox, extended: bool) -> String {
        query::request_url(&self.base_url, bbox, extended)
    }

    /// GET `url` and return the body bytes exactly as received.
    pub async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        log::debug!("GET {url}: {} bytes", body.len());
        Ok(body.to_vec())
    }

    /// GET `url` and return the body as text.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        body_text(self.fetch_raw(url).await?)
    }
}

/// Interpret a raw body as UTF-8 text.
pub fn body_text(raw: Vec<u8>) -> Result<String, FetchError> {
    String::from_utf8(raw).map_err(|_| FetchError::Utf8)
}
