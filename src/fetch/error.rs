//! Error types for the fetch module.
//!
//! Every variant carries the URL it concerns so the failure can be shown to a
//! user next to the citation it belongs to.

use thiserror::Error;

use crate::auth::CredentialError;

/// Errors that can occur while fetching a citation or text document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {source}")]
    Client {
        /// The builder failure.
        #[source]
        source: reqwest::Error,
    },

    /// The reference could not be turned into an absolute URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending reference.
        url: String,
    },

    /// The credential supplier failed (absence of a credential is not an error).
    #[error("credential unavailable for {url}: {source}")]
    Credential {
        /// The URL the credential was requested for.
        url: String,
        /// The supplier's failure.
        #[source]
        source: CredentialError,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Body exceeded the configured size cap.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// The URL whose body was too large.
        url: String,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// The body stream broke off after the response headers arrived.
    #[error("failed reading body of {url}: {source}")]
    Body {
        /// The URL whose body could not be read.
        url: String,
        /// The underlying stream error.
        #[source]
        source: reqwest::Error,
    },

    /// The body was not valid UTF-8 text.
    #[error("failed decoding text from {url}: {source}")]
    Decode {
        /// The URL whose body could not be decoded.
        url: String,
        /// The decoding failure.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a credential error.
    pub fn credential(url: impl Into<String>, source: CredentialError) -> Self {
        Self::Credential {
            url: url.into(),
            source,
        }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body size error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Creates a text decoding error.
    pub fn decode(url: impl Into<String>, source: std::string::FromUtf8Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Returns true for transport failures (status, network, timeout, size).
    ///
    /// Body read and decoding failures are the other family; callers surface
    /// both the same way.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Body { .. } | Self::Decode { .. })
    }

    /// Returns the HTTP status code if the failure was a status error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, which the source
// error does not reliably carry. Use the constructors above.
