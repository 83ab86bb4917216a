// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Never follows redirects on the first request, so a 301 is visible
// - On a 301, asks again with redirects enabled to learn the final URL
// - Falls back to GET once if HEAD did not succeed
// - Turns every network error into data (a failed CheckResult)
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Result<T, E>: The request itself returns a Result, which is converted
//   into a CheckResult in exactly one place
// =============================================================================

use reqwest::{redirect::Policy, Client, ClientBuilder, Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

// How many hops the redirect-following client may take before giving up
const MAX_REDIRECTS: usize = 10;

/// Outcome of probing one URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// True if the (final) response was a 2xx
    pub ok: bool,
    /// Final destination, set only when the URI answered 301
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// "<status> <reason>" for HTTP answers, the error text otherwise
    pub message: String,
}

impl CheckResult {
    fn failed(message: String) -> Self {
        CheckResult {
            ok: false,
            redirect: None,
            message,
        }
    }
}

/// Probes URIs over HTTP(S)
///
/// Holds two clients: one that never follows redirects (so we can see a 301)
/// and one that does (so we can find out where the 301 leads).
#[derive(Debug, Clone)]
pub struct LinkChecker {
    manual: Client,
    following: Client,
}

impl LinkChecker {
    /// Builds the HTTP clients
    ///
    /// `timeout` applies to each request. With `None` a request can wait
    /// for as long as the server keeps the connection open.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let manual = client_builder(timeout).redirect(Policy::none()).build()?;
        let following = client_builder(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(LinkChecker { manual, following })
    }

    /// Checks a single URI with the given method
    ///
    /// Never fails: DNS errors, refused connections, timeouts and malformed
    /// URLs all come back as `ok: false` with the error text as message.
    pub async fn check(&self, uri: &str, method: Method) -> CheckResult {
        match self.send_check(uri, method.clone()).await {
            Ok(result) => {
                debug!(%uri, %method, ok = result.ok, message = %result.message, "checked link");
                result
            }
            Err(error) => {
                debug!(%uri, %method, %error, "request failed");
                CheckResult::failed(error.to_string())
            }
        }
    }

    /// HEAD first, then one GET if HEAD did not come back ok
    ///
    /// Some servers reject HEAD (405, 403, ...) but serve GET just fine.
    /// The GET result is final, whatever it says.
    pub async fn check_with_fallback(&self, uri: &str) -> CheckResult {
        let result = self.check(uri, Method::HEAD).await;
        if result.ok {
            return result;
        }

        debug!(%uri, "HEAD was not ok, retrying with GET");
        self.check(uri, Method::GET).await
    }

    async fn send_check(&self, uri: &str, method: Method) -> Result<CheckResult, reqwest::Error> {
        let response = self.manual.request(method, uri).send().await?;
        let status = response.status();

        if status == StatusCode::MOVED_PERMANENTLY {
            // Ask again, this time letting the client walk the redirect chain
            let final_response = self.following.head(uri).send().await?;
            return Ok(CheckResult {
                ok: final_response.status().is_success(),
                redirect: Some(final_response.url().to_string()),
                message: status_message(status),
            });
        }

        Ok(CheckResult {
            ok: status.is_success(),
            redirect: None,
            message: status_message(status),
        })
    }
}

// Both clients share everything except the redirect policy.
// Compression is off: we never read bodies, and a truncated compressed
// body would only produce decoding errors.
fn client_builder(timeout: Option<Duration>) -> ClientBuilder {
    let builder = Client::builder()
        .user_agent(concat!("no-dead-link/", env!("CARGO_PKG_VERSION")))
        .no_gzip()
        .no_brotli()
        .no_deflate();

    match timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    }
}

/// Formats a status like "404 Not Found"
pub fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why two clients?
//    - reqwest fixes the redirect policy when the client is built
//    - The manual client lets us see the 301 itself
//    - The following client tells us where the 301 ends up
//    - Client is cheap to clone and pools connections internally
//
// 2. Why not return Result from check()?
//    - A dead link is an answer, not an error
//    - Converting in one place keeps every caller free of error handling
// -----------------------------------------------------------------------------
