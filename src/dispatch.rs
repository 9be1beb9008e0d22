//! Crawl request dispatching.
//!
//! The dispatcher is the boundary between the message channel and the
//! orchestrator. It maps request kinds onto operations, runs them, and
//! folds every operation failure into a structured error reply; nothing
//! that happens inside an operation can take the host down.
//!
//! Requests with kinds this host does not own get no reply at all. The
//! channel is shared, and silence leaves them to whichever listener owns
//! them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, trace, warn};

use crate::crawler::Crawler;
use crate::error::Result;
use crate::fetch::DirectFetcher;
use crate::identifiers::RequestId;
use crate::protocol::{CrawlAction, CrawlReply, CrawlRequest};

// ============================================================================
// Dispatcher
// ============================================================================

/// Maps crawl requests onto orchestrator operations.
pub struct Dispatcher {
    crawler: Arc<Crawler>,
    fetcher: DirectFetcher,
}

impl Dispatcher {
    /// Creates a dispatcher over a crawler and a direct fetcher.
    #[inline]
    #[must_use]
    pub fn new(crawler: Arc<Crawler>, fetcher: DirectFetcher) -> Self {
        Self { crawler, fetcher }
    }

    /// Runs the operation a request asks for and builds its reply.
    ///
    /// Returns `None` for unknown request kinds. For known kinds the
    /// reply is always `Some`: success with the operation's payload, or
    /// an error reply carrying the failure description.
    pub async fn dispatch(&self, request: CrawlRequest) -> Option<CrawlReply> {
        let Some(action) = request.action() else {
            trace!(method = %request.method, "Ignoring request for another listener");
            return None;
        };

        debug!(id = %request.id, method = %request.method, "Dispatching crawl request");
        Some(self.run(request.id, action).await)
    }

    /// Executes one action and folds its result into a reply.
    async fn run(&self, id: RequestId, action: CrawlAction) -> CrawlReply {
        let result: Result<serde_json::Value> = match action {
            CrawlAction::Open { url } => self.crawler.open(&url).await.map(|()| json!({})),

            CrawlAction::Fetch { url } => self
                .crawler
                .fetch(&url)
                .await
                .map(|html| json!({ "html": html })),

            CrawlAction::Extract => self
                .crawler
                .extract()
                .await
                .map(|html| json!({ "html": html })),

            CrawlAction::Close => self.crawler.close().await.map(|()| json!({})),

            // Direct fetch failures are data, not dispatch errors; the
            // outcome payload goes through the success channel either way.
            CrawlAction::FetchDirect { url } => {
                let outcome = self.fetcher.fetch_direct(&url).await;
                serde_json::to_value(outcome).map_err(Into::into)
            }

            CrawlAction::Ping => Ok(json!({})),
        };

        match result {
            Ok(payload) => CrawlReply::success(id, payload),
            Err(err) => {
                warn!(id = %id, error = %err, "Crawl operation failed");
                CrawlReply::failure(id, err.to_string())
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
