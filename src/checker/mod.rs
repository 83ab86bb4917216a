// src/checker/mod.rs
// =============================================================================
// This module contains all link discovery and link checking logic.
//
// Submodules:
// - extract: Finds URIs in text and link nodes of a Document
// - http: Makes HTTP requests to check if links are alive
//
// This file (mod.rs) is the module root. It re-exports the public API and
// holds the one helper both halves need: deciding whether a URI is relative.
// =============================================================================

mod extract;
mod http;

pub use extract::{extract_candidates, find_uris, Candidate};
pub use http::{status_message, CheckResult, LinkChecker};

use url::{ParseError, Url};

/// Returns true if the URI has no scheme
///
/// `./docs/a.md`, `/about` and `//cdn.example.com/x.js` are relative.
/// `https://example.com` and `mailto:me@example.com` are not.
pub fn is_relative(uri: &str) -> bool {
    matches!(Url::parse(uri), Err(ParseError::RelativeUrlWithoutBase))
}
