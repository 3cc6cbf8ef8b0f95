//! HTTP fetcher for citation bytes and text documents.
//!
//! This module provides [`HttpFetcher`], which turns a reference into an
//! absolute URL, issues a GET with the headers from a [`HeaderBuilder`], and
//! reads the whole body into memory under a size cap.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_BODY_BYTES, READ_TIMEOUT_SECS};
use super::error::FetchError;
use super::headers::{BearerHeaders, HeaderBuilder};
use crate::auth::Credential;
use crate::user_agent;

/// Network settings for an [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Base URL that relative references (e.g. `/content/a.pdf`) are joined onto.
    pub base_url: Option<Url>,
    /// Largest body accepted, in bytes.
    pub max_body_bytes: u64,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            base_url: None,
            max_body_bytes: MAX_BODY_BYTES,
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// HTTP client wrapper shared by the citation resolver and the text loader.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<Url>,
    max_body_bytes: u64,
    headers: Arc<dyn HeaderBuilder>,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with the default [`BearerHeaders`] builder.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Self::with_header_builder(config, Arc::new(BearerHeaders::new()))
    }

    /// Creates a fetcher with a custom header builder.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the HTTP client cannot be built.
    pub fn with_header_builder(
        config: FetchConfig,
        headers: Arc<dyn HeaderBuilder>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(config.user_agent)
            .gzip(true)
            .build()
            .map_err(|source| FetchError::Client { source })?;

        Ok(Self {
            client,
            base_url: config.base_url,
            max_body_bytes: config.max_body_bytes,
            headers,
        })
    }

    /// Turns a reference into the absolute URL that goes on the wire.
    ///
    /// Relative references are joined onto the configured base URL. The
    /// fragment is dropped; it never leaves this process.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for unparseable references, relative
    /// references without a base URL, and non-HTTP schemes.
    pub fn resolve_url(&self, reference: &str) -> Result<Url, FetchError> {
        let parsed = match Url::parse(reference) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .as_ref()
                .and_then(|base| base.join(reference).ok())
                .ok_or_else(|| FetchError::invalid_url(reference))?,
            Err(_) => return Err(FetchError::invalid_url(reference)),
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(reference));
        }

        let mut target = parsed;
        target.set_fragment(None);
        Ok(target)
    }

    /// Fetches the full body of `reference` as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for invalid URLs, network failures, timeouts,
    /// non-success statuses, oversized bodies, and broken body streams.
    #[instrument(skip(self, reference, credential), fields(url = %reference, authenticated = credential.is_some()))]
    pub async fn fetch_bytes(
        &self,
        reference: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<u8>, FetchError> {
        let target = self.resolve_url(reference)?;
        let response = self.send(&target, credential).await?;
        let body = read_body(response, target.as_str(), self.max_body_bytes).await?;
        debug!(bytes = body.len(), "fetch complete");
        Ok(body)
    }

    /// Fetches `reference` anonymously and decodes it as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`fetch_bytes`](Self::fetch_bytes), plus
    /// [`FetchError::Decode`] when the body is not UTF-8.
    #[instrument(skip(self, reference), fields(url = %reference))]
    pub async fn fetch_text(&self, reference: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(reference, None).await?;
        decode_text(reference, bytes)
    }

    async fn send(
        &self,
        target: &Url,
        credential: Option<&Credential>,
    ) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(target.clone())
            .headers(self.headers.build_headers(credential))
            .send()
            .await
            .map_err(|e| FetchError::network(target.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %target, "fetch returned error status");
            return Err(FetchError::http_status(target.as_str(), status.as_u16()));
        }

        if let Some(length) = response.content_length()
            && length > self.max_body_bytes
        {
            return Err(FetchError::too_large(target.as_str(), self.max_body_bytes));
        }

        Ok(response)
    }
}

/// Streams the response body into memory, enforcing `limit`.
async fn read_body(
    response: reqwest::Response,
    url: &str,
    limit: u64,
) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::body(url, e))?;
        let total = body.len().saturating_add(chunk.len());
        if u64::try_from(total).unwrap_or(u64::MAX) > limit {
            return Err(FetchError::too_large(url, limit));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Decodes a body as strict UTF-8, dropping a leading byte-order mark.
fn decode_text(url: &str, mut bytes: Vec<u8>) -> Result<String, FetchError> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }
    String::from_utf8(bytes).map_err(|e| FetchError::decode(url, e))
}
