// src/lib.rs
// =============================================================================
// no-dead-link: find dead and permanently redirected links in documents.
//
// Modules:
// - document: The node tree a rule walks over (built from Markdown)
// - checker: URI extraction and HTTP liveness checks
// - rule: The no-dead-link rule that ties both together
// - report: Diagnostics, fixes, and applying fixes to text
// - config: Rule options and how they are loaded
// - error: Error types for setup failures
//
// Typical use:
//
//   let rule = NoDeadLink::new(Options::default())?;
//   let document = Document::parse_markdown(markdown);
//   for diagnostic in rule.lint(&document).await { ... }
// =============================================================================

pub mod checker;
pub mod config;
pub mod document;
pub mod error;
pub mod report;
pub mod rule;

pub use config::Options;
pub use document::{Document, NodeKind};
pub use error::{ConfigError, Error};
pub use report::{apply_fixes, Diagnostic, Fix};
pub use rule::{FixOutcome, NoDeadLink, Outcome, RULE_NAME};
