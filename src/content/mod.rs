//! In-memory store of fetched citation bytes.
//!
//! A [`ContentHandle`] is the locally-addressable stand-in for a fetched
//! document: it has a `blob:` address that renderers can point at, and it
//! owns its entry in the [`ContentStore`]. Dropping (or explicitly releasing)
//! the handle removes the bytes, so superseded citations never accumulate.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

/// Address scheme and authority for handles.
pub const HANDLE_PREFIX: &str = "blob:citeview/";

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Shared registry of live content.
///
/// Cloning yields another view of the same registry.
#[derive(Clone, Default)]
pub struct ContentStore {
    entries: Arc<DashMap<u64, Arc<[u8]>>>,
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl ContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` and returns the handle that owns them.
    #[must_use = "dropping the handle releases the content immediately"]
    pub fn allocate(&self, bytes: Vec<u8>) -> ContentHandle {
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        let len = bytes.len();
        self.entries.insert(id, Arc::from(bytes));
        trace!(id, bytes = len, "content handle allocated");
        ContentHandle {
            id,
            address: format!("{HANDLE_PREFIX}{id}"),
            len,
            entries: Arc::clone(&self.entries),
        }
    }

    /// Looks up live content by address. A trailing `#fragment` is ignored.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<Arc<[u8]>> {
        let id = parse_address(address)?;
        self.entries.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of handles that have not been released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.entries.len()
    }
}

fn parse_address(address: &str) -> Option<u64> {
    let bare = address.split_once('#').map_or(address, |(bare, _)| bare);
    bare.strip_prefix(HANDLE_PREFIX)?.parse().ok()
}

/// Owner of one entry in a [`ContentStore`].
///
/// Not `Clone`: exactly one owner holds the content at a time.
pub struct ContentHandle {
    id: u64,
    address: String,
    len: usize,
    entries: Arc<DashMap<u64, Arc<[u8]>>>,
}

impl ContentHandle {
    /// The handle's address, without any fragment.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Size of the stored content in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the stored content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the stored bytes.
    #[must_use]
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.entries.get(&self.id).map(|entry| Arc::clone(entry.value()))
    }

    /// Releases the content now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ContentHandle {
    fn drop(&mut self) {
        if self.entries.remove(&self.id).is_some() {
            trace!(id = self.id, "content handle released");
        }
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHandle")
            .field("address", &self.address)
            .field("len", &self.len)
            .finish()
    }
}
