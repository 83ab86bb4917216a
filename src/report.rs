// src/report.rs
// =============================================================================
// Diagnostics, fixes, and applying fixes to source text.
//
// A rule reports a Diagnostic against a node. The diagnostic keeps both the
// offset relative to that node (what the rule computed) and the absolute
// position in the document (what a user wants to see as line:column).
//
// A Fix is a single "replace this byte range with that text" edit, always in
// absolute document coordinates so fixes from different nodes can be applied
// together.
// =============================================================================

use crate::document::{Document, NodeId};
use serde::Serialize;
use std::ops::Range;
use tracing::warn;

/// A suggested edit: replace `range` of the source with `text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub range: Range<usize>,
    pub text: String,
}

/// One problem found by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule: &'static str,
    pub message: String,
    /// Offset relative to the start of the reported node
    pub index: usize,
    /// Absolute byte offset in the document
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Diagnostic {
    /// Builds a diagnostic at `index` bytes into `node`
    pub fn new(
        document: &Document,
        rule: &'static str,
        node: NodeId,
        message: impl Into<String>,
        index: usize,
        fix: Option<Fix>,
    ) -> Self {
        let offset = document.node(node).range.start + index;
        let (line, column) = document.line_column(offset);

        Diagnostic {
            rule,
            message: message.into(),
            index,
            offset,
            line,
            column,
            fix,
        }
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}

/// Builds fixes in document coordinates from node-relative ranges
pub struct Fixer<'a> {
    document: &'a Document,
}

impl<'a> Fixer<'a> {
    pub fn new(document: &'a Document) -> Self {
        Fixer { document }
    }

    /// Replaces `range` (relative to `node`) with `text`
    pub fn replace_text_range(&self, node: NodeId, range: Range<usize>, text: impl Into<String>) -> Fix {
        let start = self.document.node(node).range.start;
        Fix {
            range: start + range.start..start + range.end,
            text: text.into(),
        }
    }
}

/// Applies every fix carried by `diagnostics` to `source`
///
/// Fixes are applied in source order. A fix that overlaps one already
/// applied, or that does not fall on valid character boundaries, is skipped.
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> String {
    let mut fixes: Vec<&Fix> = diagnostics.iter().filter_map(|d| d.fix.as_ref()).collect();
    fixes.sort_by_key(|fix| (fix.range.start, fix.range.end));

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;

    for fix in fixes {
        if fix.range.start < cursor || source.get(fix.range.clone()).is_none() {
            warn!(start = fix.range.start, end = fix.range.end, "skipping fix that cannot be applied");
            continue;
        }
        output.push_str(&source[cursor..fix.range.start]);
        output.push_str(&fix.text);
        cursor = fix.range.end;
    }

    output.push_str(&source[cursor..]);
    output
}
