//! Selection of a render strategy for resolved citation content.

use serde::Serialize;

use crate::citation::{ContentKind, ResolvedContent};

/// How a citation should be presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum RenderStrategy {
    /// No citation: render nothing.
    Nothing,
    /// Static image at `src` (handle address, fragment kept).
    Image {
        /// Address of the image bytes.
        src: String,
    },
    /// Markdown: load `source` (the original reference) as text through the
    /// document loader instead of decoding the fetched bytes, so sanitization
    /// always applies.
    Markdown {
        /// The original citation reference.
        source: String,
    },
    /// Embeddable frame at `src` (handle address, fragment kept).
    Frame {
        /// Address of the framed content.
        src: String,
    },
}

/// Maps resolved content to its render strategy. Pure; performs no I/O.
#[must_use]
pub fn classify(content: Option<&ResolvedContent>) -> RenderStrategy {
    let Some(content) = content else {
        return RenderStrategy::Nothing;
    };
    match content.kind() {
        ContentKind::Image => RenderStrategy::Image {
            src: content.external_address(),
        },
        ContentKind::Markdown => RenderStrategy::Markdown {
            source: content.reference().as_str().to_string(),
        },
        ContentKind::Other => RenderStrategy::Frame {
            src: content.external_address(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::citation::CitationReference;
    use crate::content::ContentStore;

    fn resolved(store: &ContentStore, reference: &str) -> ResolvedContent {
        ResolvedContent::new(CitationReference::new(reference), store.allocate(vec![0]))
    }

    #[test]
    fn test_no_content_renders_nothing() {
        assert_eq!(classify(None), RenderStrategy::Nothing);
    }

    #[test]
    fn test_image_uses_handle_with_fragment() {
        let store = ContentStore::new();
        let content = resolved(&store, "https://x/doc.png#page=3");
        let RenderStrategy::Image { src } = classify(Some(&content)) else {
            panic!("expected image strategy");
        };
        assert_eq!(src, format!("{}#page=3", content.handle().address()));
    }

    #[test]
    fn test_markdown_uses_original_reference() {
        let store = ContentStore::new();
        let content = resolved(&store, "https://x/readme.md");
        assert_eq!(
            classify(Some(&content)),
            RenderStrategy::Markdown {
                source: "https://x/readme.md".to_string()
            }
        );
    }

    #[test]
    fn test_other_uses_frame_with_fragment() {
        let store = ContentStore::new();
        let content = resolved(&store, "https://x/report.PDF#page=12");
        let RenderStrategy::Frame { src } = classify(Some(&content)) else {
            panic!("expected frame strategy");
        };
        assert!(src.starts_with(content.handle().address()));
        assert!(src.ends_with("#page=12"));
    }

    #[test]
    fn test_frame_without_fragment_has_bare_address() {
        let store = ContentStore::new();
        let content = resolved(&store, "https://x/report.pdf");
        assert_eq!(
            classify(Some(&content)),
            RenderStrategy::Frame {
                src: content.handle().address().to_string()
            }
        );
    }

    #[test]
    fn test_strategy_serializes_with_tag() {
        let json = serde_json::to_value(RenderStrategy::Markdown {
            source: "a.md".to_string(),
        })
        .unwrap();
        assert_eq!(json["strategy"], "markdown");
        assert_eq!(json["source"], "a.md");

        let json = serde_json::to_value(RenderStrategy::Nothing).unwrap();
        assert_eq!(json["strategy"], "nothing");
    }
}
