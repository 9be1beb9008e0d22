//! Direct HTTP fetch fallback.
//!
//! Some pages do not need the crawl tab at all; the requester can ask for
//! a plain bounded-time HTTP fetch instead. The fallback shares nothing
//! with the tab session: no handle, no store, no browser.
//!
//! Failures here are data, not dispatch errors. Whatever goes wrong
//! (deadline, HTTP status, wrong content type) comes back as a
//! [`FetchOutcome`] payload so the requester can decide what to do next.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// User agent sent with direct fetches.
pub const DIRECT_FETCH_USER_AGENT: &str = concat!("tab-crawler/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

// ============================================================================
// FetchOutcome
// ============================================================================

/// Result payload of a direct fetch.
///
/// Serializes untagged into the two wire shapes:
///
/// ```json
/// { "html": "<html>..." }
/// { "error": "HTTP 404 Not Found", "status": 404 }
/// ```
///
/// `status` is the HTTP status code for non-success responses and `0` for
/// everything that never produced one (bad URL, timeout, wrong content
/// type, transport failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FetchOutcome {
    /// The page body, verified to be HTML.
    Html {
        /// Response body.
        html: String,
    },

    /// The fetch failed; the crawl can fall back to the tab.
    Failed {
        /// Human-readable failure description.
        error: String,
        /// HTTP status code, or 0 when none applies.
        status: u16,
    },
}

impl FetchOutcome {
    /// Creates a success outcome.
    #[inline]
    #[must_use]
    pub fn html(html: impl Into<String>) -> Self {
        Self::Html { html: html.into() }
    }

    /// Creates a failure outcome.
    #[inline]
    #[must_use]
    pub fn failed(error: impl Into<String>, status: u16) -> Self {
        Self::Failed {
            error: error.into(),
            status,
        }
    }

    /// Returns `true` if the fetch produced HTML.
    #[inline]
    #[must_use]
    pub fn is_html(&self) -> bool {
        matches!(self, Self::Html { .. })
    }
}

// ============================================================================
// DirectFetcher
// ============================================================================

/// Bounded-time HTTP fetcher.
///
/// The client follows a handful of redirects, carries its own user agent,
/// and gives the whole request one deadline.
#[derive(Debug, Clone)]
pub struct DirectFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl DirectFetcher {
    /// Creates a fetcher with the given request deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .user_agent(DIRECT_FETCH_USER_AGENT)
            .build()
            .map_err(|err| Error::config(format!("Failed to build fetch client: {err}")))?;

        Ok(Self { client, timeout })
    }

    /// Fetches a URL directly and reports the outcome in-band.
    pub async fn fetch_direct(&self, url: &str) -> FetchOutcome {
        let target = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            _ => return FetchOutcome::failed(format!("Invalid fetch URL: {url}"), 0),
        };

        debug!(url, "Direct fetch");
        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                warn!(url, "Direct fetch timed out");
                return FetchOutcome::failed(
                    format!("Fetch timed out after {}ms", self.timeout.as_millis()),
                    0,
                );
            }
            Err(err) => {
                warn!(url, error = %err, "Direct fetch failed");
                return FetchOutcome::failed(format!("Fetch failed: {err}"), 0);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::failed(format!("HTTP {status}"), status.as_u16());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_html_content_type(&content_type) {
            return FetchOutcome::failed(format!("Non-HTML content type: {content_type}"), 0);
        }

        match response.text().await {
            Ok(html) => {
                debug!(url, bytes = html.len(), "Direct fetch succeeded");
                FetchOutcome::html(html)
            }
            Err(err) if err.is_timeout() => FetchOutcome::failed(
                format!("Fetch timed out after {}ms", self.timeout.as_millis()),
                0,
            ),
            Err(err) => FetchOutcome::failed(format!("Fetch failed: {err}"), 0),
        }
    }
}

// ============================================================================
// Content Type Gate
// ============================================================================

/// Returns `true` for content types the crawl treats as HTML.
///
/// Parameters (`charset=...`) are ignored and matching is
/// case-insensitive. A missing or empty declaration does not pass.
#[must_use]
pub fn is_html_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

// ============================================================================
// Tests
// ============================================================================
