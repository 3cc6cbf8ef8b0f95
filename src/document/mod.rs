//! Loading of remote text documents for display.
//!
//! [`TextDocumentLoader`] shares the resolver's state machine: every
//! [`load`](TextDocumentLoader::load) supersedes the previous one and only
//! the latest URL's result becomes visible. Fetched text passes through
//! [`strip_anchor_links`] before it is published.

mod sanitize;

pub use sanitize::strip_anchor_links;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::fetch::{FetchError, HttpFetcher};
use crate::state::{ErrorInfo, Generation, LoadState, Publication, StateSlot};

/// Message shown when a text document cannot be loaded.
pub const DOCUMENT_LOAD_FAILED: &str = "Failed loading document.";

/// Fetches, decodes and sanitizes text documents.
///
/// Fetches are anonymous. A failed load carries the URL as a direct-download
/// fallback ([`ErrorInfo::download_url`]).
#[derive(Debug, Clone)]
pub struct TextDocumentLoader {
    inner: Arc<LoaderInner>,
}

#[derive(Debug)]
struct LoaderInner {
    fetcher: HttpFetcher,
    slot: StateSlot<String>,
}

impl TextDocumentLoader {
    /// Creates a loader. Its state is `Loading` until the first load settles.
    #[must_use]
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                fetcher,
                slot: StateSlot::new(LoadState::Loading),
            }),
        }
    }

    /// Loads `url` on the current task and publishes the outcome.
    pub async fn load(&self, url: &str) -> Publication {
        let generation = self.begin();
        self.load_as(generation, url).await
    }

    /// Starts loading `url` in the background and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, url: impl Into<String>) -> JoinHandle<Publication> {
        let url = url.into();
        let generation = self.begin();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(generation, &url).await })
    }

    /// Supersedes any load in flight and drops the current text.
    ///
    /// The state returns to `Loading`, as for a fresh loader.
    pub fn clear(&self) {
        self.begin();
    }

    /// Supersedes the current load and returns the new call's generation.
    pub(crate) fn begin(&self) -> Generation {
        self.inner.slot.begin(LoadState::Loading)
    }

    /// Returns true if nothing has superseded `generation`.
    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        self.inner.slot.is_current(generation)
    }

    /// Loads `url` as the call identified by `generation`, which must come
    /// from [`begin`](Self::begin).
    pub(crate) async fn load_as(&self, generation: Generation, url: &str) -> Publication {
        self.inner.run(generation, url).await
    }

    /// Borrows the current state.
    pub fn state(&self) -> watch::Ref<'_, LoadState<String>> {
        self.inner.slot.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState<String>> {
        self.inner.slot.subscribe()
    }
}

impl LoaderInner {
    #[instrument(skip(self, url), fields(url = %url))]
    async fn run(&self, generation: Generation, url: &str) -> Publication {
        let next = match self.fetch(url).await {
            Ok(text) => {
                info!(chars = text.len(), "document loaded");
                LoadState::Ready(text)
            }
            Err(error) => {
                warn!(error = %error, "document load failed");
                LoadState::Failed(ErrorInfo::new(DOCUMENT_LOAD_FAILED, error).with_download_url(url))
            }
        };
        self.slot.publish(generation, next)
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let text = self.fetcher.fetch_text(url).await?;
        let sanitized = strip_anchor_links(&text);
        if sanitized.len() != text.len() {
            debug!(
                removed = text.len() - sanitized.len(),
                "stripped anchor links"
            );
        }
        Ok(sanitized.into_owned())
    }
}
