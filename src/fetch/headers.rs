//! Request header construction.

use reqwest::header::{AUTHORIZATION, HeaderMap};

use crate::auth::Credential;

/// Builds the headers attached to an outgoing fetch.
pub trait HeaderBuilder: Send + Sync {
    /// Returns the headers for a request made with `credential`, if any.
    fn build_headers(&self, credential: Option<&Credential>) -> HeaderMap;
}

/// Default builder: `Authorization: Bearer …` iff a credential is present,
/// plus a fixed set of extra headers.
#[derive(Debug, Clone, Default)]
pub struct BearerHeaders {
    extra: HeaderMap,
}

impl BearerHeaders {
    /// Creates a builder with no extra headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that always appends `extra`.
    ///
    /// An `Authorization` entry in `extra` is ignored; authorization only
    /// ever comes from the credential.
    #[must_use]
    pub fn with_extra(mut extra: HeaderMap) -> Self {
        extra.remove(AUTHORIZATION);
        Self { extra }
    }
}

impl HeaderBuilder for BearerHeaders {
    fn build_headers(&self, credential: Option<&Credential>) -> HeaderMap {
        let mut headers = self.extra.clone();
        if let Some(credential) = credential {
            headers.insert(AUTHORIZATION, credential.authorization().clone());
        }
        headers
    }
}
