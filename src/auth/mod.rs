//! Bearer credentials and the supplier seam used by citation resolution.
//!
//! The core never logs in and never caches a token. Each resolution asks its
//! [`CredentialSupplier`] afresh; `Ok(None)` means "proceed anonymously".
//!
//! # Example
//!
//! ```
//! use citeview_core::auth::{Credential, CredentialSupplier, StaticCredential};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let supplier = StaticCredential::new(Credential::bearer("token-123")?);
//! let credential = supplier.credential().await?;
//! assert!(credential.is_some());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building or acquiring a credential.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// The token is empty or contains bytes that cannot appear in a header.
    #[error("invalid bearer token: {reason}")]
    InvalidToken {
        /// Why the token was rejected.
        reason: String,
    },

    /// The supplier could not produce a credential.
    #[error("credential unavailable: {reason}")]
    Unavailable {
        /// Why acquisition failed.
        reason: String,
    },
}

impl CredentialError {
    /// Creates an `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(reason: &str) -> Self {
        Self::InvalidToken {
            reason: reason.to_string(),
        }
    }

    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(reason: &str) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }
}

/// An opaque bearer token, ready to be attached as an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    header: HeaderValue,
}

impl Credential {
    /// Builds a bearer credential from a raw token.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidToken`] when the token is blank or is
    /// not a valid header value.
    pub fn bearer(token: impl AsRef<str>) -> Result<Self, CredentialError> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(CredentialError::invalid_token("token is empty"));
        }
        let mut header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| CredentialError::invalid_token("token contains invalid characters"))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }

    /// Returns the complete `Authorization` header value.
    #[must_use]
    pub fn authorization(&self) -> &HeaderValue {
        &self.header
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(Bearer <redacted>)")
    }
}

/// Source of the credential attached to a citation fetch.
///
/// Uses `async_trait` so suppliers can be passed as `Arc<dyn CredentialSupplier>`
/// into spawned resolutions.
#[async_trait]
pub trait CredentialSupplier: Send + Sync {
    /// Acquires a credential; `Ok(None)` means anonymous access.
    async fn credential(&self) -> Result<Option<Credential>, CredentialError>;
}

/// Supplier for anonymous access.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl CredentialSupplier for Anonymous {
    async fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(None)
    }
}

/// Supplier that always hands out the same token.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    credential: Credential,
}

impl StaticCredential {
    /// Creates a supplier for a fixed credential.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl CredentialSupplier for StaticCredential {
    async fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(Some(self.credential.clone()))
    }
}

/// Supplier that reads a bearer token from an environment variable on every call.
///
/// An unset or blank variable yields anonymous access.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    /// Creates a supplier reading `var`.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Returns the environment variable name.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl CredentialSupplier for EnvCredential {
    async fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Credential::bearer(token).map(Some),
            Ok(_) | Err(std::env::VarError::NotPresent) => {
                debug!(var = %self.var, "no token in environment; proceeding anonymously");
                Ok(None)
            }
            Err(std::env::VarError::NotUnicode(_)) => Err(CredentialError::unavailable(
                &format!("environment variable {} is not valid unicode", self.var),
            )),
        }
    }
}

/// Supplier backed by an async closure, e.g. a token refresh call.
pub struct FnSupplier<F> {
    supply: F,
}

impl<F> FnSupplier<F> {
    /// Wraps `supply`.
    pub fn new(supply: F) -> Self {
        Self { supply }
    }
}

impl<F> fmt::Debug for FnSupplier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSupplier").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> CredentialSupplier for FnSupplier<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Credential>, CredentialError>> + Send,
{
    async fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        (self.supply)().await
    }
}
