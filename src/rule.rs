// src/rule.rs
// =============================================================================
// The no-dead-link rule.
//
// What happens for one document:
// 1. Walk the tree and collect Candidates (see checker::extract)
// 2. Once the walk is done, lint every candidate concurrently
// 3. Wait for all of them, then turn each Outcome into a diagnostic (or none)
//
// Each candidate moves through a small state machine:
//
//   Discovered -> Skipped | ConfigError | Checked
//   Checked    -> Dead | Redirected | Alive
//
// Only ConfigError, Dead and Redirected produce a diagnostic. Redirected
// diagnostics carry a fix that swaps the old URI for its final destination.
//
// The same entry point serves both linting and fixing: `fix()` just runs
// `lint()` and applies whatever fixes came back.
// =============================================================================

use crate::checker::{extract_candidates, is_relative, Candidate, CheckResult, LinkChecker};
use crate::config::Options;
use crate::document::Document;
use crate::error::Error;
use crate::report::{apply_fixes, Diagnostic, Fixer};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

pub const RULE_NAME: &str = "no-dead-link";

/// What became of one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ignored, or relative while relative checking is off
    Skipped,
    /// Relative URI but no base URI to resolve it against
    ConfigError,
    /// Not reachable; `uri` is what was actually requested
    Dead { uri: String, message: String },
    /// Answered 301 and the final destination is reachable
    Redirected {
        uri: String,
        redirect: String,
        message: String,
    },
    Alive,
}

/// Result of running the rule in fix mode
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The source with all applicable fixes applied
    pub output: String,
    /// Every diagnostic found, fixable or not
    pub diagnostics: Vec<Diagnostic>,
}

pub struct NoDeadLink {
    check_relative: bool,
    base_uri: Option<Url>,
    ignore: HashSet<String>,
    checker: LinkChecker,
}

impl NoDeadLink {
    /// Validates the options and prepares the HTTP clients
    pub fn new(options: Options) -> Result<Self, Error> {
        let base_uri = options.parsed_base_uri()?;
        let checker = LinkChecker::new(options.timeout())?;

        Ok(NoDeadLink {
            check_relative: options.check_relative,
            base_uri,
            ignore: options.ignore.into_iter().collect(),
            checker,
        })
    }

    /// Reports dead and redirected links in `document`
    ///
    /// Diagnostics come back in the order the links appear in the document,
    /// even though the checks themselves run concurrently.
    pub async fn lint(&self, document: &Document) -> Vec<Diagnostic> {
        let candidates = extract_candidates(document);
        debug!(count = candidates.len(), "collected link candidates");

        // join_all waits for every check; none of them can fail, so one
        // broken link never cancels the others
        let outcomes = join_all(candidates.iter().map(|candidate| self.lint_candidate(candidate))).await;

        candidates
            .iter()
            .zip(outcomes)
            .filter_map(|(candidate, outcome)| self.report(document, candidate, outcome))
            .collect()
    }

    /// Like `lint`, and also returns the source with redirect fixes applied
    pub async fn fix(&self, document: &Document) -> FixOutcome {
        let diagnostics = self.lint(document).await;
        let output = apply_fixes(document.source(), &diagnostics);
        FixOutcome { output, diagnostics }
    }

    /// Decides the fate of a single candidate, doing network I/O if needed
    pub async fn lint_candidate(&self, candidate: &Candidate) -> Outcome {
        if self.ignore.contains(&candidate.uri) {
            return Outcome::Skipped;
        }

        let uri = if is_relative(&candidate.uri) {
            if !self.check_relative {
                return Outcome::Skipped;
            }
            let Some(base) = &self.base_uri else {
                return Outcome::ConfigError;
            };
            match base.join(&candidate.uri) {
                Ok(resolved) => resolved.to_string(),
                Err(error) => {
                    return Outcome::Dead {
                        uri: candidate.uri.clone(),
                        message: error.to_string(),
                    }
                }
            }
        } else {
            candidate.uri.clone()
        };

        // The ignore list may also name the resolved form
        if uri != candidate.uri && self.ignore.contains(&uri) {
            return Outcome::Skipped;
        }

        match self.checker.check_with_fallback(&uri).await {
            CheckResult { ok: false, message, .. } => Outcome::Dead { uri, message },
            CheckResult {
                ok: true,
                redirect: Some(redirect),
                message,
            } => Outcome::Redirected {
                uri,
                redirect,
                message,
            },
            CheckResult { ok: true, redirect: None, .. } => Outcome::Alive,
        }
    }

    fn report(&self, document: &Document, candidate: &Candidate, outcome: Outcome) -> Option<Diagnostic> {
        match outcome {
            Outcome::Skipped | Outcome::Alive => None,
            Outcome::ConfigError => {
                warn!(uri = %candidate.uri, "relative link found but no base URI is configured");
                Some(Diagnostic::new(
                    document,
                    RULE_NAME,
                    candidate.node,
                    "The base URI is not specified.",
                    0,
                    None,
                ))
            }
            Outcome::Dead { uri, message } => Some(Diagnostic::new(
                document,
                RULE_NAME,
                candidate.node,
                format!("{} is dead. ({})", uri, message),
                candidate.index,
                None,
            )),
            Outcome::Redirected {
                uri,
                redirect,
                message,
            } => {
                // The fix covers the text as written, which may be shorter
                // than `uri` when it was resolved against the base URI.
                // Targets that are not spelled out verbatim in the source
                // (reference links, escapes, entities) get no fix.
                let range = candidate.index..candidate.index + candidate.uri.len();
                let located = document.source_of(candidate.node).get(range.clone()) == Some(candidate.uri.as_str());
                if !located {
                    debug!(uri = %candidate.uri, "redirect target is not written verbatim, no fix attached");
                }
                let fix = located.then(|| Fixer::new(document).replace_text_range(candidate.node, range, redirect));
                Some(Diagnostic::new(
                    document,
                    RULE_NAME,
                    candidate.node,
                    format!("{} is redirected. ({})", uri, message),
                    candidate.index,
                    fix,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rule(options: Options) -> NoDeadLink {
        NoDeadLink::new(Options {
            timeout_secs: Some(5),
            ..options
        })
        .unwrap()
    }

    async fn respond(server: &MockServer, http_method: &str, route: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_alive_link_is_silent() {
        let server = MockServer::start().await;
        respond(&server, "HEAD", "/ok", 200).await;

        let doc = Document::parse_markdown(format!("[ok]({}/ok)", server.uri()));
        assert!(rule(Options::default()).lint(&doc).await.is_empty());
    }

    #[tokio::test]
    async fn test_dead_link_after_get_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let uri = format!("{}/missing", server.uri());
        let doc = Document::parse_markdown(format!("See [gone]({})", uri));
        let diagnostics = rule(Options::default()).lint(&doc).await;

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.message, format!("{} is dead. (404 Not Found)", uri));
        assert_eq!(diagnostic.index, 7);
        assert_eq!(diagnostic.offset, 11);
        assert_eq!(diagnostic.fix, None);
    }

    #[tokio::test]
    async fn test_head_rejected_but_get_ok_is_silent() {
        let server = MockServer::start().await;
        respond(&server, "HEAD", "/page", 405).await;
        respond(&server, "GET", "/page", 200).await;

        let doc = Document::parse_markdown(format!("[page]({}/page)", server.uri()));
        assert!(rule(Options::default()).lint(&doc).await.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_is_reported_with_fix() {
        let server = MockServer::start().await;
        let old = format!("{}/old", server.uri());
        let new = format!("{}/new", server.uri());
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", new.as_str()))
            .mount(&server)
            .await;
        respond(&server, "HEAD", "/new", 200).await;

        let source = format!("Moved: [docs]({}) here", old);
        let doc = Document::parse_markdown(source.as_str());
        let outcome = rule(Options::default()).fix(&doc).await;

        assert_eq!(outcome.diagnostics.len(), 1);
        let diagnostic = &outcome.diagnostics[0];
        assert_eq!(
            diagnostic.message,
            format!("{} is redirected. (301 Moved Permanently)", old)
        );
        assert_eq!(diagnostic.index, 7);

        let fix = diagnostic.fix.as_ref().unwrap();
        assert_eq!(&source[fix.range.clone()], old);
        assert_eq!(fix.text, new);
        assert_eq!(outcome.output, format!("Moved: [docs]({}) here", new));
    }

    async fn moved_permanently(server: &MockServer, route: &str) -> String {
        let new = format!("{}/new", server.uri());
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", new.as_str()))
            .mount(server)
            .await;
        respond(server, "HEAD", "/new", 200).await;
        new
    }

    #[tokio::test]
    async fn test_redirected_reference_link_has_no_fix() {
        let server = MockServer::start().await;
        moved_permanently(&server, "/old").await;

        let source = format!(
            "Read [the docs][ref] and keep going with more prose here.\n\n[ref]: {}/old\n",
            server.uri()
        );
        let doc = Document::parse_markdown(source.as_str());
        let outcome = rule(Options::default()).fix(&doc).await;

        assert_eq!(outcome.diagnostics.len(), 1);
        let diagnostic = &outcome.diagnostics[0];
        assert!(diagnostic.message.ends_with("is redirected. (301 Moved Permanently)"));
        assert_eq!(diagnostic.index, 0);
        assert_eq!(diagnostic.fix, None);
        assert_eq!(outcome.output, source);
    }

    #[tokio::test]
    async fn test_redirected_escaped_target_has_no_fix() {
        let server = MockServer::start().await;
        moved_permanently(&server, "/a_b").await;

        let source = format!("Intro [see this page]({}/a\\_b) tail text", server.uri());
        let doc = Document::parse_markdown(source.as_str());
        let outcome = rule(Options::default()).fix(&doc).await;

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].message,
            format!("{}/a_b is redirected. (301 Moved Permanently)", server.uri())
        );
        assert_eq!(outcome.diagnostics[0].fix, None);
        assert_eq!(outcome.output, source);
    }

    #[tokio::test]
    async fn test_redirect_to_dead_target_is_dead() {
        let server = MockServer::start().await;
        let new = format!("{}/new", server.uri());
        Mock::given(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", new.as_str()))
            .mount(&server)
            .await;
        respond(&server, "HEAD", "/new", 404).await;

        let old = format!("{}/old", server.uri());
        let doc = Document::parse_markdown(format!("[x]({})", old));
        let diagnostics = rule(Options::default()).lint(&doc).await;

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            format!("{} is dead. (301 Moved Permanently)", old)
        );
    }

    #[tokio::test]
    async fn test_ignored_link_is_never_checked() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;

        let uri = format!("{}/flaky", server.uri());
        let doc = Document::parse_markdown(format!("[flaky]({})", uri));
        let rule = rule(Options {
            ignore: vec![uri],
            ..Options::default()
        });

        assert!(rule.lint(&doc).await.is_empty());
    }

    #[tokio::test]
    async fn test_relative_link_skipped_by_default() {
        let doc = Document::parse_markdown("See [docs](./docs/README.md)");
        assert!(rule(Options::default()).lint(&doc).await.is_empty());
    }

    #[tokio::test]
    async fn test_relative_link_without_base_uri() {
        let doc = Document::parse_markdown("Intro\n\nSee [docs](./docs/README.md)");
        let rule = rule(Options {
            check_relative: true,
            ..Options::default()
        });

        let diagnostics = rule.lint(&doc).await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "The base URI is not specified.");
        assert_eq!(diagnostics[0].index, 0);
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (3, 5));
    }

    #[tokio::test]
    async fn test_relative_link_resolved_against_base() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/docs/guide.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        respond(&server, "HEAD", "/docs/gone.html", 404).await;
        respond(&server, "GET", "/docs/gone.html", 404).await;

        let doc = Document::parse_markdown("[a](guide.html) and [b](gone.html)");
        let rule = rule(Options {
            check_relative: true,
            base_uri: Some(format!("{}/docs/", server.uri())),
            ..Options::default()
        });

        let diagnostics = rule.lint(&doc).await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            format!("{}/docs/gone.html is dead. (404 Not Found)", server.uri())
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_dead() {
        // A space in the host makes the request fail before anything is sent
        let candidate = Candidate {
            node: 0,
            uri: "http://exa mple.com/".to_string(),
            index: 0,
        };
        let outcome = rule(Options::default()).lint_candidate(&candidate).await;
        assert!(matches!(outcome, Outcome::Dead { .. }));
    }

    #[tokio::test]
    async fn test_every_occurrence_is_checked() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .expect(2)
            .mount(&server)
            .await;

        let uri = format!("{}/gone", server.uri());
        let doc = Document::parse_markdown(format!("[a]({0})\n\n> [quoted]({0})\n\n[b]({0})", uri));
        let diagnostics = rule(Options::default()).lint(&doc).await;

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].offset < diagnostics[1].offset);
    }

    #[tokio::test]
    async fn test_same_document_same_diagnostics() {
        let server = MockServer::start().await;
        respond(&server, "HEAD", "/a", 500).await;
        respond(&server, "GET", "/a", 500).await;
        respond(&server, "HEAD", "/b", 200).await;

        let doc = Document::parse_markdown(format!(
            "[a]({0}/a) [b]({0}/b) [c]({0}/a)",
            server.uri()
        ));
        let rule = rule(Options::default());

        let first = rule.lint(&doc).await;
        let second = rule.lint(&doc).await;
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_base_uri_is_rejected() {
        let result = NoDeadLink::new(Options {
            base_uri: Some("not a url".to_string()),
            timeout_secs: Some(1),
            ..Options::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_timeout_option_is_accepted() {
        let options = Options {
            timeout_secs: Some(2),
            ..Options::default()
        };
        assert_eq!(options.timeout(), Some(Duration::from_secs(2)));
        assert!(NoDeadLink::new(options).is_ok());
    }
}
