//! Removal of same-document anchor links from markdown.
//!
//! Links such as `[Installation](#installation)` point at headings that have
//! no address once the document is shown outside its original site, so they
//! are stripped before display. This is a textual substitution, not a
//! markdown parse.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// `[label](#target)`, where the label may contain one level of nested
/// brackets (`[see [1]](#refs)`) and neither part spans a line.
#[allow(clippy::expect_used)]
static ANCHOR_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:[^\[\]\n]|\[[^\[\]\n]*\])*\]\(#[^)\n]*\)")
        .expect("anchor link regex is valid") // Static pattern, safe to panic
});

/// Removes every same-document anchor link from `markdown`.
///
/// Idempotent: removing one link can splice together text that forms a new
/// anchor link, so substitution repeats until nothing matches.
#[must_use]
pub fn strip_anchor_links(markdown: &str) -> Cow<'_, str> {
    let mut text = Cow::Borrowed(markdown);
    while ANCHOR_LINK_PATTERN.is_match(&text) {
        text = Cow::Owned(ANCHOR_LINK_PATTERN.replace_all(&text, "").into_owned());
    }
    text
}
