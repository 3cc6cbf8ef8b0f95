//! Shared User-Agent string for citation and document fetches.

/// Default User-Agent for every request issued by the fetch layer.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("citeview/{version} (citation-viewer)")
}
