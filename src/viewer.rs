//! A citation view: resolver, dispatcher and document loader wired together.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::auth::CredentialSupplier;
use crate::citation::{CitationReference, CitationResolver};
use crate::content::ContentStore;
use crate::dispatch::{RenderStrategy, classify};
use crate::document::TextDocumentLoader;
use crate::fetch::HttpFetcher;
use crate::state::{ErrorInfo, LoadState, Publication};

/// What the view currently shows.
#[derive(Debug, Clone)]
pub enum ViewState {
    /// No citation selected.
    Empty,
    /// Citation resolution in flight.
    Loading,
    /// Citation resolution failed.
    Failed(ErrorInfo),
    /// Image at `src`.
    Image {
        /// Handle address, fragment kept.
        src: String,
    },
    /// Embedded frame at `src`.
    Frame {
        /// Handle address, fragment kept.
        src: String,
    },
    /// Markdown document, loaded and sanitized as text.
    Document(LoadState<String>),
}

/// The owner of one citation's content.
///
/// Opening a new reference supersedes the previous one; closing the view or
/// dropping it releases the content.
#[derive(Clone)]
pub struct CitationViewer {
    resolver: CitationResolver,
    loader: TextDocumentLoader,
    credentials: Arc<dyn CredentialSupplier>,
    // Held while an `open` or `close` supersedes both slots, so the resolver
    // and the loader always agree on which call is the latest.
    sequence: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CitationViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitationViewer")
            .field("resolver", &self.resolver)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl CitationViewer {
    /// Creates a viewer whose resolver and loader share `fetcher`.
    #[must_use]
    pub fn new(
        fetcher: HttpFetcher,
        store: ContentStore,
        credentials: Arc<dyn CredentialSupplier>,
    ) -> Self {
        Self {
            resolver: CitationResolver::new(fetcher.clone(), store),
            loader: TextDocumentLoader::new(fetcher),
            credentials,
            sequence: Arc::new(Mutex::new(())),
        }
    }

    /// Resolves `reference` and, for markdown, loads it as a text document.
    ///
    /// Both the resolution and the markdown load belong to this call: a later
    /// `open` or a `close` supersedes them together. Returns
    /// [`Publication::Discarded`] if that happened before this call finished.
    pub async fn open(&self, reference: impl Into<CitationReference>) -> Publication {
        let reference = reference.into();
        let (document, resolution) = {
            let _sequence = self
                .sequence
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            (self.loader.begin(), self.resolver.begin(&reference))
        };

        let publication = match resolution {
            Some(generation) => {
                self.resolver
                    .run(generation, reference, self.credentials.as_ref())
                    .await
            }
            None => Publication::Applied,
        };
        if publication == Publication::Discarded {
            return publication;
        }

        let strategy = self.strategy();
        if !self.loader.is_current(document) {
            debug!("citation superseded before its document load");
            return Publication::Discarded;
        }
        match strategy {
            RenderStrategy::Markdown { source } => {
                debug!(source = %source, "loading markdown citation as text");
                self.loader.load_as(document, &source).await
            }
            _ => publication,
        }
    }

    /// The render strategy for the current citation.
    #[must_use]
    pub fn strategy(&self) -> RenderStrategy {
        let state = self.resolver.state();
        classify(state.ready().and_then(Option::as_ref))
    }

    /// Snapshot of what the view shows.
    #[must_use]
    pub fn view(&self) -> ViewState {
        let state = self.resolver.state();
        match &*state {
            LoadState::Loading => ViewState::Loading,
            LoadState::Failed(info) => ViewState::Failed(info.clone()),
            LoadState::Ready(content) => match classify(content.as_ref()) {
                RenderStrategy::Nothing => ViewState::Empty,
                RenderStrategy::Image { src } => ViewState::Image { src },
                RenderStrategy::Frame { src } => ViewState::Frame { src },
                RenderStrategy::Markdown { .. } => {
                    ViewState::Document(self.loader.state().clone())
                }
            },
        }
    }

    /// Tears the view down: supersedes any `open` in flight, releases the
    /// current content and drops any loaded document text.
    pub fn close(&self) {
        let _sequence = self
            .sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.loader.clear();
        self.resolver.clear();
    }

    /// The underlying resolver.
    #[must_use]
    pub fn resolver(&self) -> &CitationResolver {
        &self.resolver
    }

    /// The underlying document loader.
    #[must_use]
    pub fn loader(&self) -> &TextDocumentLoader {
        &self.loader
    }
}
