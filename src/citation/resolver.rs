//! The citation resolver state machine.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{CitationReference, ResolvedContent};
use crate::auth::CredentialSupplier;
use crate::content::ContentStore;
use crate::fetch::{FetchError, HttpFetcher};
use crate::state::{ErrorInfo, Generation, LoadState, Publication, StateSlot};

/// Message shown when a citation cannot be resolved.
pub const CITATION_LOAD_FAILED: &str = "Failed loading citation.";

/// Resolves citation references into [`ResolvedContent`].
///
/// One resolver backs one citation view. Each call to
/// [`resolve`](Self::resolve) or [`start`](Self::start) supersedes the
/// previous one: only the most recent reference's result ever becomes the
/// visible state, and content fetched for a superseded reference is released
/// as soon as that call finishes.
///
/// The state is `Ready(None)` when there is nothing to show.
///
/// # Example
///
/// ```no_run
/// use citeview_core::auth::Anonymous;
/// use citeview_core::citation::CitationResolver;
/// use citeview_core::content::ContentStore;
/// use citeview_core::fetch::{FetchConfig, HttpFetcher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = CitationResolver::new(HttpFetcher::new(FetchConfig::default())?, ContentStore::new());
/// resolver.resolve("https://example.com/report.pdf#page=4", &Anonymous).await;
/// if let Some(Some(content)) = resolver.state().ready() {
///     println!("{}", content.external_address());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CitationResolver {
    inner: Arc<ResolverInner>,
}

#[derive(Debug)]
struct ResolverInner {
    fetcher: HttpFetcher,
    store: ContentStore,
    slot: StateSlot<Option<ResolvedContent>>,
}

impl CitationResolver {
    /// Creates an idle resolver (`Ready(None)`).
    #[must_use]
    pub fn new(fetcher: HttpFetcher, store: ContentStore) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                fetcher,
                store,
                slot: StateSlot::new(LoadState::Ready(None)),
            }),
        }
    }

    /// Resolves `reference` on the current task and publishes the outcome.
    ///
    /// Returns [`Publication::Discarded`] if another call started before this
    /// one finished.
    pub async fn resolve(
        &self,
        reference: impl Into<CitationReference>,
        credentials: &dyn CredentialSupplier,
    ) -> Publication {
        let reference = reference.into();
        match self.begin(&reference) {
            Some(generation) => self.run(generation, reference, credentials).await,
            None => Publication::Applied,
        }
    }

    /// Supersedes the previous call. Returns `None` for an empty reference,
    /// in which case there is nothing to [`run`](Self::run).
    pub(crate) fn begin(&self, reference: &CitationReference) -> Option<Generation> {
        self.inner.begin(reference)
    }

    /// Resolves `reference` as the call identified by `generation`.
    pub(crate) async fn run(
        &self,
        generation: Generation,
        reference: CitationReference,
        credentials: &dyn CredentialSupplier,
    ) -> Publication {
        self.inner.run(generation, reference, credentials).await
    }

    /// Starts resolving `reference` in the background and returns immediately.
    ///
    /// The state is `Loading` by the time this returns. Must be called from
    /// within a tokio runtime.
    pub fn start(
        &self,
        reference: impl Into<CitationReference>,
        credentials: Arc<dyn CredentialSupplier>,
    ) -> JoinHandle<Publication> {
        let reference = reference.into();
        let generation = self.inner.begin(&reference);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match generation {
                Some(generation) => inner.run(generation, reference, credentials.as_ref()).await,
                None => Publication::Applied,
            }
        })
    }

    /// Tears down the current citation: supersedes any call in flight and
    /// releases the current content.
    pub fn clear(&self) {
        self.inner.slot.begin(LoadState::Ready(None));
    }

    /// Borrows the current state.
    pub fn state(&self) -> watch::Ref<'_, LoadState<Option<ResolvedContent>>> {
        self.inner.slot.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState<Option<ResolvedContent>>> {
        self.inner.slot.subscribe()
    }

    /// The store that owns resolved content.
    #[must_use]
    pub fn store(&self) -> &ContentStore {
        &self.inner.store
    }
}

impl ResolverInner {
    /// Supersedes the previous call. Returns `None` for an empty reference,
    /// which leaves the resolver inert.
    fn begin(&self, reference: &CitationReference) -> Option<Generation> {
        if reference.is_empty() {
            debug!("empty citation reference; resolver idle");
            self.slot.begin(LoadState::Ready(None));
            return None;
        }
        Some(self.slot.begin(LoadState::Loading))
    }

    #[instrument(skip(self, reference, credentials), fields(reference = %reference))]
    async fn run(
        &self,
        generation: Generation,
        reference: CitationReference,
        credentials: &dyn CredentialSupplier,
    ) -> Publication {
        let next = match self.fetch(generation, &reference, credentials).await {
            Ok(Some(content)) => {
                info!(
                    kind = content.kind().as_str(),
                    address = %content.external_address(),
                    bytes = content.handle().len(),
                    "citation resolved"
                );
                LoadState::Ready(Some(content))
            }
            Ok(None) => return Publication::Discarded,
            Err(error) => {
                warn!(error = %error, "citation resolution failed");
                LoadState::Failed(ErrorInfo::new(CITATION_LOAD_FAILED, error))
            }
        };
        self.slot.publish(generation, next)
    }

    /// Returns `Ok(None)` when superseded before the fetch was issued.
    async fn fetch(
        &self,
        generation: Generation,
        reference: &CitationReference,
        credentials: &dyn CredentialSupplier,
    ) -> Result<Option<ResolvedContent>, FetchError> {
        let credential = credentials
            .credential()
            .await
            .map_err(|e| FetchError::credential(reference.path(), e))?;

        if !self.slot.is_current(generation) {
            debug!("superseded during credential acquisition; skipping fetch");
            return Ok(None);
        }

        let bytes = self
            .fetcher
            .fetch_bytes(reference.path(), credential.as_ref())
            .await?;
        let handle = self.store.allocate(bytes);
        Ok(Some(ResolvedContent::new(reference.clone(), handle)))
    }
}
