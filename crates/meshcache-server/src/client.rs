//! HTTP client stub for one remote peer.

use crate::wire;
use async_trait::async_trait;
use meshcache_core::{ByteView, Error, PeerGetter, Result};
use std::time::Duration;

/// Fetches values from a single peer over `GET {base}/{group}/{key}`.
///
/// Every remote peer gets its own stub because the stub is bound to that
/// peer's base URL. The request deadline covers the whole round-trip;
/// exceeding it surfaces as a soft `PeerTransport` error.
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    /// Creates a stub for the peer at `peer_addr`, e.g.
    /// `http://localhost:8002`, fetching under `base_path`.
    ///
    /// # Errors
    ///
    /// `Internal` if the underlying HTTP client cannot be constructed.
    pub fn new(peer_addr: &str, base_path: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("http client: {e}")))?;
        Ok(Self {
            base_url: format!("{}{}", peer_addr.trim_end_matches('/'), base_path),
            http,
        })
    }

    /// Base URL this stub fetches from, prefix included.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PeerGetter for HttpClient {
    async fn get(&self, group: &str, key: &str) -> Result<ByteView> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::PeerTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PeerTransport(format!("peer returned {status}")));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::PeerTransport(e.to_string()))?;
        wire::decode_value(&body)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
