//! Citation references and extension-based content classification.

use std::fmt;

use serde::Serialize;

/// Locator for a backing document, optionally with a `#fragment` sub-location.
///
/// The reference is split once, at the first `#`. The part before is what
/// gets fetched; the part after means nothing to the transport but must be
/// carried over to whatever address the content ends up at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CitationReference {
    raw: String,
    hash_at: Option<usize>,
}

impl CitationReference {
    /// Creates a reference from its raw string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let hash_at = raw.find('#');
        Self { raw, hash_at }
    }

    /// The reference exactly as issued.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true for an empty reference (nothing to resolve).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Everything before the first `#`.
    #[must_use]
    pub fn path(&self) -> &str {
        match self.hash_at {
            Some(at) => &self.raw[..at],
            None => &self.raw,
        }
    }

    /// Everything after the first `#`, or `None` when absent or empty.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.hash_at
            .map(|at| &self.raw[at + 1..])
            .filter(|fragment| !fragment.is_empty())
    }

    /// Classifies the reference by the extension of its path.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        ContentKind::from_path(self.path())
    }
}

impl fmt::Display for CitationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for CitationReference {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for CitationReference {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Coarse content type, used to pick a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentKind {
    /// `.png`
    #[serde(rename = "image")]
    Image,
    /// `.md`
    #[serde(rename = "markdown-text")]
    Markdown,
    /// Anything else, including no extension.
    #[serde(rename = "other")]
    Other,
}

impl ContentKind {
    /// Classifies by the case-insensitive suffix after the last `.` of `path`.
    ///
    /// Only the extension is consulted, never a content-type header. A query
    /// string is not part of the extension, and a "suffix" that still contains
    /// a `/` means the last path segment has no extension at all.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split_once('?').map_or(path, |(before, _)| before);
        let Some((_, extension)) = path.rsplit_once('.') else {
            return Self::Other;
        };
        if extension.contains('/') {
            return Self::Other;
        }
        match extension.to_ascii_lowercase().as_str() {
            "png" => Self::Image,
            "md" => Self::Markdown,
            _ => Self::Other,
        }
    }

    /// Stable label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Markdown => "markdown-text",
            Self::Other => "other",
        }
    }
}
