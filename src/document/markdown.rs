// src/document/markdown.rs
// =============================================================================
// This module turns Markdown text into a Document tree.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Reports the byte range of every event through `into_offset_iter()`
//
// Start/End events open and close container nodes, so a stack of open
// nodes is enough to rebuild the tree. Text events become Str leaves.
// pulldown-cmark sometimes splits one run of text into several events
// (for example at `_` or `*` that do not form emphasis). Neighbouring text
// events are merged back into one Str node so a URL is never cut in half.
// =============================================================================

use super::{Document, NodeId, NodeKind};
use pulldown_cmark::{Event, Options as ParserOptions, Parser, Tag};
use std::ops::Range;

pub(super) fn build(source: String) -> Document {
    let mut document = Document {
        nodes: vec![super::Node {
            kind: NodeKind::Document,
            range: 0..source.len(),
            parent: None,
            children: Vec::new(),
            url: None,
        }],
        source: String::new(),
    };

    // Ids of the containers that are currently open, root first
    let mut open: Vec<NodeId> = vec![document.root()];

    for (event, range) in Parser::new_ext(&source, parser_options()).into_offset_iter() {
        let parent = *open.last().unwrap_or(&0);

        match event {
            Event::Start(tag) => {
                let (kind, url) = classify(&tag);
                let id = document.push(parent, kind, range, url);
                open.push(id);
            }
            Event::End(_) => {
                // Never pop the root
                if open.len() > 1 {
                    open.pop();
                }
            }
            Event::Text(_) => {
                // Code block contents are not prose
                if document.nodes[parent].kind == NodeKind::CodeBlock {
                    continue;
                }
                if !extend_text(&mut document, parent, &range) {
                    document.push(parent, NodeKind::Str, range, None);
                }
            }
            Event::SoftBreak => {
                // A soft line break continues the current text run
                extend_text(&mut document, parent, &range);
            }
            Event::HardBreak => {
                document.push(parent, NodeKind::Break, range, None);
            }
            Event::Code(_) => {
                document.push(parent, NodeKind::Code, range, None);
            }
            Event::Html(_) => {
                document.push(parent, NodeKind::Html, range, None);
            }
            // Thematic breaks, footnote references and task markers carry
            // no text we care about
            _ => {}
        }
    }

    document.source = source;
    document
}

fn parser_options() -> ParserOptions {
    let mut options = ParserOptions::empty();
    options.insert(ParserOptions::ENABLE_TABLES);
    options.insert(ParserOptions::ENABLE_STRIKETHROUGH);
    options.insert(ParserOptions::ENABLE_FOOTNOTES);
    options.insert(ParserOptions::ENABLE_TASKLISTS);
    options
}

// Maps a pulldown-cmark tag to our node kind, keeping the target URL for
// links and images
// In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
fn classify(tag: &Tag<'_>) -> (NodeKind, Option<String>) {
    match tag {
        Tag::Paragraph => (NodeKind::Paragraph, None),
        Tag::Heading(..) => (NodeKind::Heading, None),
        Tag::BlockQuote => (NodeKind::BlockQuote, None),
        Tag::CodeBlock(_) => (NodeKind::CodeBlock, None),
        Tag::List(_) => (NodeKind::List, None),
        Tag::Item => (NodeKind::ListItem, None),
        Tag::Table(_) => (NodeKind::Table, None),
        Tag::TableHead | Tag::TableRow => (NodeKind::TableRow, None),
        Tag::TableCell => (NodeKind::TableCell, None),
        Tag::Emphasis => (NodeKind::Emphasis, None),
        Tag::Strong => (NodeKind::Strong, None),
        Tag::Strikethrough => (NodeKind::Delete, None),
        Tag::Link(_link_type, dest_url, _title) => (NodeKind::Link, Some(dest_url.to_string())),
        Tag::Image(_link_type, dest_url, _title) => (NodeKind::Image, Some(dest_url.to_string())),
        Tag::FootnoteDefinition(_) => (NodeKind::Other, None),
    }
}

// Grows the last child of `parent` to cover `range` if that child is a Str.
// Returns false when there was no text run to extend.
fn extend_text(document: &mut Document, parent: NodeId, range: &Range<usize>) -> bool {
    let Some(&last) = document.nodes[parent].children.last() else {
        return false;
    };

    let node = &mut document.nodes[last];
    if node.kind != NodeKind::Str || node.range.end > range.start {
        return false;
    }

    node.range.end = range.end;
    true
}
