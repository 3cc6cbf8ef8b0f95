//! HTTP transport for citation and text-document fetches.
//!
//! # Example
//!
//! ```no_run
//! use citeview_core::fetch::{FetchConfig, HttpFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new(FetchConfig::default())?;
//! let text = fetcher.fetch_text("https://example.com/README.md").await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod headers;

pub use client::{FetchConfig, HttpFetcher};
pub use error::FetchError;
pub use headers::{BearerHeaders, HeaderBuilder};
