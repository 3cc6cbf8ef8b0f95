//! Load state shared by the citation resolver and the text document loader.
//!
//! Both components follow the same shape: a call supersedes whatever state
//! came before it, runs to completion, and publishes its result only if no
//! later call has started in the meantime. [`StateSlot`] owns that rule.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::fetch::FetchError;

/// What the caller renders.
#[derive(Debug, Clone)]
pub enum LoadState<T> {
    /// A call is in flight.
    Loading,
    /// The call completed.
    Ready(T),
    /// The call failed; terminal for that call only.
    Failed(ErrorInfo),
}

impl<T> LoadState<T> {
    /// Returns true while a call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the ready value, if any.
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Failed(info) => Some(info),
            _ => None,
        }
    }
}

/// A failure ready for display.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    message: String,
    cause: Arc<FetchError>,
    download_url: Option<String>,
}

impl ErrorInfo {
    /// Wraps `cause` with a human-readable `message`.
    #[must_use]
    pub fn new(message: impl Into<String>, cause: FetchError) -> Self {
        Self {
            message: message.into(),
            cause: Arc::new(cause),
            download_url: None,
        }
    }

    /// Attaches a direct-download fallback link.
    #[must_use]
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original failure.
    #[must_use]
    pub fn cause(&self) -> &FetchError {
        &self.cause
    }

    /// URL offered as a fallback download link, if any.
    #[must_use]
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.cause)
    }
}

/// Identity of one call against a [`StateSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Whether a finished call's result became visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// The result is now the current state.
    Applied,
    /// A later call had started; the result was dropped.
    Discarded,
}

/// Current [`LoadState`] of one resolver or loader, with last-call-wins publication.
pub struct StateSlot<T> {
    generation: AtomicU64,
    tx: watch::Sender<LoadState<T>>,
}

impl<T> StateSlot<T> {
    /// Creates a slot holding `initial`.
    pub fn new(initial: LoadState<T>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            generation: AtomicU64::new(0),
            tx,
        }
    }

    /// Starts a new call: every earlier call becomes stale and `initial`
    /// replaces the current state. The replaced state is dropped here.
    pub fn begin(&self, initial: LoadState<T>) -> Generation {
        let generation = Generation(self.generation.fetch_add(1, Ordering::AcqRel) + 1);
        let previous = self.tx.send_replace(initial);
        drop(previous);
        generation
    }

    /// Returns true if no call has started since `generation`.
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation.load(Ordering::Acquire) == generation.0
    }

    /// Publishes `next` if `generation` is still current; otherwise drops it.
    pub fn publish(&self, generation: Generation, next: LoadState<T>) -> Publication {
        let mut pending = Some(next);
        let applied = self.tx.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            if let Some(next) = pending.take() {
                *state = next;
            }
            true
        });

        if applied {
            Publication::Applied
        } else {
            debug!(generation = generation.0, "discarding stale result");
            drop(pending);
            Publication::Discarded
        }
    }

    /// Borrows the current state.
    pub fn borrow(&self) -> watch::Ref<'_, LoadState<T>> {
        self.tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.tx.subscribe()
    }
}

impl<T> fmt::Debug for StateSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSlot")
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
