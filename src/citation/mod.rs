//! Citation resolution: reference in, locally-addressable content out.
//!
//! - [`CitationReference`] - locator with an optional `#fragment`
//! - [`ContentKind`] - extension-based classification
//! - [`ResolvedContent`] - fetched bytes behind a handle, fragment preserved
//! - [`CitationResolver`] - last-call-wins resolution state machine

mod reference;
mod resolver;

pub use reference::{CitationReference, ContentKind};
pub use resolver::{CITATION_LOAD_FAILED, CitationResolver};

use crate::content::ContentHandle;

/// A resolved citation.
///
/// Owns its [`ContentHandle`]; the bytes are released when this value is
/// dropped, which happens when the resolver moves on to another reference or
/// is cleared.
#[derive(Debug)]
pub struct ResolvedContent {
    reference: CitationReference,
    handle: ContentHandle,
    kind: ContentKind,
}

impl ResolvedContent {
    /// Binds fetched content to the reference it was fetched for.
    #[must_use]
    pub fn new(reference: CitationReference, handle: ContentHandle) -> Self {
        let kind = reference.kind();
        Self {
            reference,
            handle,
            kind,
        }
    }

    /// The reference this content was resolved from.
    #[must_use]
    pub fn reference(&self) -> &CitationReference {
        &self.reference
    }

    /// The handle owning the bytes.
    #[must_use]
    pub fn handle(&self) -> &ContentHandle {
        &self.handle
    }

    /// The content classification.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// The fragment recovered from the reference, if any.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.reference.fragment()
    }

    /// The address consumers should use: `handle#fragment`, or the bare
    /// handle address when the reference had no fragment.
    #[must_use]
    pub fn external_address(&self) -> String {
        match self.fragment() {
            Some(fragment) => format!("{}#{fragment}", self.handle.address()),
            None => self.handle.address().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStore;

    #[test]
    fn test_external_address_reattaches_fragment() {
        let store = ContentStore::new();
        let content = ResolvedContent::new(
            CitationReference::new("https://x/doc.png#page=3"),
            store.allocate(vec![0]),
        );
        let address = content.external_address();
        assert!(address.starts_with(content.handle().address()));
        assert!(address.ends_with("#page=3"), "got {address}");
        assert_eq!(content.kind(), ContentKind::Image);
    }

    #[test]
    fn test_external_address_without_fragment_has_no_hash() {
        let store = ContentStore::new();
        let content = ResolvedContent::new(
            CitationReference::new("https://x/doc.pdf"),
            store.allocate(vec![0]),
        );
        assert!(!content.external_address().contains('#'));
        assert_eq!(content.fragment(), None);
    }

    #[test]
    fn test_dropping_resolved_content_releases_handle() {
        let store = ContentStore::new();
        let content = ResolvedContent::new(
            CitationReference::new("https://x/doc.pdf"),
            store.allocate(vec![0]),
        );
        assert_eq!(store.live_handles(), 1);
        drop(content);
        assert_eq!(store.live_handles(), 0);
    }
}
