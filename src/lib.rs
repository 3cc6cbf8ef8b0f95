//! Citeview Core Library
//!
//! Resolves citation references into locally-addressable content, loads and
//! sanitizes remote text documents, and picks the render strategy a viewer
//! should use for each.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`citation`] - Citation references, classification and the resolver
//! - [`document`] - Text document loading and anchor-link sanitization
//! - [`dispatch`] - Render strategy selection
//! - [`viewer`] - Resolver, dispatcher and loader composed into one view
//! - [`state`] - Shared load state and last-call-wins publication
//! - [`content`] - In-memory content store and handles
//! - [`fetch`] - HTTP transport
//! - [`auth`] - Bearer credentials and credential suppliers

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod citation;
pub mod content;
pub mod dispatch;
pub mod document;
pub mod fetch;
pub mod state;
pub mod viewer;
mod user_agent;

// Re-export commonly used types
pub use auth::{Anonymous, Credential, CredentialSupplier, EnvCredential, StaticCredential};
pub use citation::{CitationReference, CitationResolver, ContentKind, ResolvedContent};
pub use content::{ContentHandle, ContentStore};
pub use dispatch::{RenderStrategy, classify};
pub use document::{TextDocumentLoader, strip_anchor_links};
pub use fetch::{FetchConfig, FetchError, HttpFetcher};
pub use state::{ErrorInfo, LoadState, Publication};
pub use viewer::{CitationViewer, ViewState};
