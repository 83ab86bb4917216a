// src/document/mod.rs
// =============================================================================
// This module holds the document tree that the link rule walks over.
//
// A Document owns the original source text plus a flat arena of nodes.
// Every node knows its kind, the byte range it covers in the source, its
// parent and its children. Nodes are addressed by index (NodeId), which keeps
// the tree free of lifetimes and reference counting.
//
// Submodules:
// - markdown: Builds a Document from Markdown using pulldown-cmark
//
// Rust concepts:
// - Arenas: Storing tree nodes in a Vec and linking them by index
// - Iterators: A custom pre-order walk over the tree
// - Range<usize>: Byte spans into the source text
// =============================================================================

mod markdown;

use serde::Serialize;
use std::ops::Range;

/// Index of a node inside its Document
pub type NodeId = usize;

/// Every kind of node the tree can contain
///
/// The set is closed on purpose: rules dispatch with a `match` over this enum
/// instead of looking handlers up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    BlockQuote,
    List,
    ListItem,
    Emphasis,
    Strong,
    Delete,
    Link,
    Image,
    /// Plain text
    Str,
    /// Inline code span
    Code,
    CodeBlock,
    Html,
    Break,
    Table,
    TableRow,
    TableCell,
    Other,
}

/// One node of the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Byte range of this node in the document source
    pub range: Range<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Declared target of a link or image, if this node has one
    pub url: Option<String>,
}

/// A parsed document: source text plus its node tree
///
/// The root node always has id 0 and kind `NodeKind::Document`.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    nodes: Vec<Node>,
}

impl Document {
    /// Parses Markdown source into a document tree
    ///
    /// Example:
    ///   let doc = Document::parse_markdown("See [Rust](https://www.rust-lang.org)");
    pub fn parse_markdown(source: impl Into<String>) -> Self {
        markdown::build(source.into())
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// The complete source text
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the source text covered by a node
    ///
    /// This is what a rule sees as the node's "raw" text, so offsets found in
    /// it can be turned back into document positions by adding the node's
    /// range start.
    pub fn source_of(&self, id: NodeId) -> &str {
        let range = self.nodes[id].range.clone();
        self.source.get(range).unwrap_or("")
    }

    /// Returns true if any ancestor of `id` has one of the given kinds
    ///
    /// The node itself is not considered, only its parents up to the root.
    pub fn is_child_of(&self, id: NodeId, kinds: &[NodeKind]) -> bool {
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            if kinds.contains(&self.nodes[parent].kind) {
                return true;
            }
            current = self.nodes[parent].parent;
        }
        false
    }

    /// Walks the whole tree in pre-order (parents before children,
    /// children in source order), starting at the root
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            document: self,
            stack: vec![self.root()],
        }
    }

    /// Converts a byte offset into a 1-based (line, column) pair
    ///
    /// Columns count characters, not bytes, so the numbers match what an
    /// editor shows for non-ASCII text.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let mut end = offset.min(self.source.len());
        while !self.source.is_char_boundary(end) {
            end -= 1;
        }
        let before = &self.source[..end];

        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map(|last_line| last_line.chars().count())
            .unwrap_or(0)
            + 1;

        (line, column)
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind, range: Range<usize>, url: Option<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            range,
            parent: Some(parent),
            children: Vec::new(),
            url,
        });
        self.nodes[parent].children.push(id);
        id
    }
}

/// Pre-order iterator returned by `Document::walk`
pub struct Walk<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Push in reverse so the first child is visited first
        self.stack
            .extend(self.document.nodes[id].children.iter().rev().copied());
        Some(id)
    }
}
