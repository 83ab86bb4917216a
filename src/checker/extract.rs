// src/checker/extract.rs
// =============================================================================
// This module finds the URIs a document mentions.
//
// Two kinds of nodes carry URIs:
// - Str nodes (plain text): scanned with a permissive URL regex
// - Link nodes: their declared target is taken as-is
//
// Each hit becomes a Candidate that remembers the node it came from and the
// byte offset of the URI inside that node's source text. The offset is what
// lets us point diagnostics at the right column and replace exactly the
// right text when fixing a redirect.
//
// Nodes inside a block quote are never checked. Text inside a link is not
// scanned either, otherwise `[https://x.org](https://x.org)` would be
// reported twice. Image alt text is not prose and is skipped as well.
// =============================================================================

use crate::document::{Document, NodeId, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Scheme is optional, `//` is not. The host must end in a 2-6 letter label
// followed by an ASCII word boundary.
// False positives only cost an extra HTTP request, so the pattern leans
// towards matching too much rather than too little.
static URI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(https?:)?//(www\.)?[-a-zA-Z0-9@:%._+~#=]{2,256}\.[a-z]{2,6}(?-u:\b)([-a-zA-Z0-9@:%_+.~#?&/=]*)",
    )
    .unwrap()
});

/// A URI occurrence waiting to be checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// The node the URI was found in
    pub node: NodeId,
    /// The URI exactly as written (or as declared by the link)
    pub uri: String,
    /// Byte offset of the URI inside the node's source text
    pub index: usize,
}

/// Collects every checkable URI in the document, in discovery order
pub fn extract_candidates(document: &Document) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for id in document.walk() {
        let node = document.node(id);

        match node.kind {
            NodeKind::Str => {
                if document.is_child_of(id, &[NodeKind::BlockQuote, NodeKind::Link, NodeKind::Image]) {
                    continue;
                }
                candidates.extend(find_uris(document.source_of(id)).into_iter().map(
                    |(index, uri)| Candidate {
                        node: id,
                        uri,
                        index,
                    },
                ));
            }
            NodeKind::Link => {
                if document.is_child_of(id, &[NodeKind::BlockQuote]) {
                    continue;
                }
                let uri = node.url.clone().unwrap_or_default();
                let index = link_target_index(document, id, &uri);
                candidates.push(Candidate { node: id, uri, index });
            }
            _ => {}
        }
    }

    candidates
}

/// Returns every URL-looking substring of `text` with its byte offset
///
/// Example:
///   find_uris("see https://example.com now") == [(4, "https://example.com")]
pub fn find_uris(text: &str) -> Vec<(usize, String)> {
    URI_PATTERN
        .find_iter(text)
        .map(|found| (found.start(), found.as_str().to_string()))
        .collect()
}

// Locates the link target inside the raw link text.
//
// [text](http://example.com)
//       ^
// The search starts after the visible text so a label that repeats the URL
// does not shadow the real target. Targets that only exist after parsing
// (reference links, escaped characters) fall back to offset 0.
fn link_target_index(document: &Document, id: NodeId, uri: &str) -> usize {
    let node = document.node(id);
    let raw = document.source_of(id);

    let label_end = node
        .children
        .last()
        .map(|last| document.node(*last).range.end.saturating_sub(node.range.start))
        .unwrap_or(0);

    raw.get(label_end..)
        .and_then(|rest| rest.find(uri))
        .map(|found| found + label_end)
        .or_else(|| raw.find(uri))
        .unwrap_or(0)
}
