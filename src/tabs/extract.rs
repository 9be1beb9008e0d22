//! Page content serialization.
//!
//! Extraction runs a read-only snippet in the crawl tab's top document and
//! returns the serialized DOM as a string. Nothing is mutated in the page;
//! parsing the result is the requester's business.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::tabs::TabHost;

// ============================================================================
// Serialization Snippet
// ============================================================================

/// Snippet serializing the rendered document, root element included.
pub const SERIALIZE_SNIPPET: &str = "return document.documentElement.outerHTML;";

// ============================================================================
// Extractor
// ============================================================================

/// Serializes the rendered page of a tab.
pub struct Extractor {
    host: Arc<dyn TabHost>,
}

impl Extractor {
    /// Creates an extractor over the given tab host.
    #[inline]
    #[must_use]
    pub fn new(host: Arc<dyn TabHost>) -> Self {
        Self { host }
    }

    /// Returns the tab's rendered page as an HTML string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtractionFailed`] when the snippet produces no
    /// result, which is what pages that forbid script injection look
    /// like. Transport failures propagate as-is.
    pub async fn extract(&self, tab_id: TabId) -> Result<String> {
        debug!(tab_id = %tab_id, "Extracting page content");

        match self.host.run_snippet(tab_id, SERIALIZE_SNIPPET).await? {
            Some(html) if !html.is_empty() => {
                debug!(tab_id = %tab_id, bytes = html.len(), "Page content extracted");
                Ok(html)
            }
            _ => Err(Error::extraction_failed(tab_id)),
        }
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
