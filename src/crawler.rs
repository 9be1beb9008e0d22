//! Crawl tab orchestration.
//!
//! [`Crawler`] owns the lifecycle of the single crawl tab: open it, drive
//! it through navigations, extract rendered pages, and close it. The
//! session (which tab is the crawl tab) lives in the [`SessionStore`], not
//! in memory; every operation re-derives it, so the orchestrator survives
//! host restarts and tolerates the tab disappearing under it.
//!
//! # Operation Flow
//!
//! | Operation | Steps |
//! |-----------|-------|
//! | `open` | replace stale tab, create, persist, wait for load |
//! | `fetch` | require live tab, navigate, wait for load, settle, extract |
//! | `extract` | require live tab, extract current page |
//! | `close` | best-effort close, always forget the session |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::host::CrawlConfig;
use crate::identifiers::TabId;
use crate::protocol::{ParsedTabEvent, TabStatus};
use crate::store::SessionStore;
use crate::tabs::{Extractor, LoadWaiter, TabHost};

// ============================================================================
// Crawler
// ============================================================================

/// The crawl tab state machine.
///
/// Clones of the surrounding `Arc` are shared between the dispatcher,
/// which runs operations, and the event pump, which feeds
/// [`handle_event`](Crawler::handle_event).
pub struct Crawler {
    host: Arc<dyn TabHost>,
    store: SessionStore,
    waiter: LoadWaiter,
    extractor: Extractor,
    config: CrawlConfig,
}

impl Crawler {
    /// Creates a crawler over a tab host and session store.
    #[must_use]
    pub fn new(host: Arc<dyn TabHost>, store: SessionStore, config: CrawlConfig) -> Self {
        let extractor = Extractor::new(host.clone());
        Self {
            host,
            store,
            waiter: LoadWaiter::new(),
            extractor,
            config,
        }
    }

    /// Returns the session store backing this crawler.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Opens a fresh crawl tab at `url`.
    ///
    /// Any previously persisted tab is closed best-effort and forgotten
    /// first, so repeated opens always leave exactly one crawl tab. The
    /// new tab is persisted before its load is awaited; a restart in
    /// between still knows which tab it owns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for non-http(s) targets and
    /// [`Error::OpenFailed`] when the tab does not finish loading within
    /// the load timeout.
    pub async fn open(&self, url: &str) -> Result<()> {
        validate_url(url)?;
        info!(url, "Opening crawl tab");

        if let Some(stale) = self.store.get().await? {
            debug!(tab_id = %stale, "Replacing existing crawl tab");
            if let Err(err) = self.host.close_tab(stale).await {
                warn!(tab_id = %stale, error = %err, "Stale crawl tab close failed");
            }
            self.store.clear().await?;
        }

        let tab_id = self.host.open_tab(url).await?;
        self.store.set(tab_id).await?;

        // Register before probing: a load that completes between the two
        // resolves through the event instead of being missed.
        let wait = self.waiter.begin(tab_id);
        match self.host.tab_status(tab_id).await {
            Ok(Some(TabStatus::Complete)) => {
                info!(tab_id = %tab_id, "Crawl tab opened");
                return Ok(());
            }
            Ok(_) => {}
            Err(err) => {
                warn!(tab_id = %tab_id, error = %err, "Status probe failed, waiting for load event");
            }
        }

        match wait.wait(self.config.load_timeout).await {
            Ok(()) => {
                info!(tab_id = %tab_id, "Crawl tab opened");
                Ok(())
            }
            Err(err) if err.is_timeout() => {
                warn!(tab_id = %tab_id, url, "Crawl tab never finished loading");
                self.abandon(tab_id).await;
                Err(Error::open_failed(url))
            }
            Err(err) => Err(err),
        }
    }

    /// Navigates the crawl tab to `url` and returns the rendered page.
    ///
    /// After the load completes, a fixed settle delay gives client-side
    /// rendering time to fill the page in; only then is the DOM
    /// serialized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTab`] without an open session,
    /// [`Error::TabClosed`] when the tab vanished (the session is cleared
    /// in the same step), [`Error::LoadTimeout`] when the navigation does
    /// not complete in time, and [`Error::ExtractionFailed`] when the
    /// page cannot be serialized.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        validate_url(url)?;
        let tab_id = self.require_live_tab().await?;
        info!(tab_id = %tab_id, url, "Fetching page in crawl tab");

        // Register before navigating; completion may arrive before the
        // navigate command even returns.
        let wait = self.waiter.begin(tab_id);
        self.host.navigate(tab_id, url).await?;
        wait.wait(self.config.load_timeout).await?;

        // No DOM signal marks client-side rendering done; the fixed delay
        // is the stand-in.
        tokio::time::sleep(self.config.settle_delay).await;

        self.extractor.extract(tab_id).await
    }

    /// Returns the crawl tab's current page without navigating.
    ///
    /// Captures whatever state user-driven steps left in the tab.
    ///
    /// # Errors
    ///
    /// Returns the same session and extraction errors as
    /// [`fetch`](Crawler::fetch), minus the navigation ones.
    pub async fn extract(&self) -> Result<String> {
        let tab_id = self.require_live_tab().await?;
        debug!(tab_id = %tab_id, "Extracting current page");
        self.extractor.extract(tab_id).await
    }

    /// Closes the crawl tab and forgets the session.
    ///
    /// The browser-side close is best-effort; the session is forgotten
    /// either way. Closing without a session is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) only when the session file
    /// cannot be removed.
    pub async fn close(&self) -> Result<()> {
        let tab_id = match self.store.get().await {
            Ok(tab_id) => tab_id,
            Err(err) => {
                warn!(error = %err, "Session read failed during close");
                None
            }
        };

        match tab_id {
            Some(tab_id) => {
                info!(tab_id = %tab_id, "Closing crawl tab");
                if let Err(err) = self.host.close_tab(tab_id).await {
                    warn!(tab_id = %tab_id, error = %err, "Crawl tab close failed, forgetting session anyway");
                }
            }
            None => debug!("Close with no active crawl session"),
        }

        self.store.clear().await
    }

    // ========================================================================
    // Event Handling
    // ========================================================================

    /// Applies a browser tab event.
    ///
    /// Load completions resolve pending waits; removals reconcile the
    /// persisted session when the crawl tab was closed externally. Event
    /// application never fails; anomalies are logged and skipped.
    pub async fn handle_event(&self, event: &ParsedTabEvent) {
        match event {
            ParsedTabEvent::StatusChanged { tab_id, status } => {
                let Some(tab_id) = TabId::new(*tab_id) else {
                    return;
                };
                trace!(tab_id = %tab_id, status = %status, "Tab status changed");
                if *status == TabStatus::Complete {
                    self.waiter.notify_complete(tab_id);
                }
            }

            ParsedTabEvent::Removed { tab_id } => {
                let Some(tab_id) = TabId::new(*tab_id) else {
                    return;
                };
                self.reconcile_removed(tab_id).await;
            }

            ParsedTabEvent::Unknown { method, .. } => {
                trace!(method, "Ignoring unknown tab event");
            }
        }
    }

    /// Fails every pending load wait.
    ///
    /// Called when the bridge connection is lost; in-flight fetches
    /// resolve with a channel error instead of hanging until timeout.
    pub fn fail_pending_waits(&self) {
        self.waiter.fail_pending();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Reads the session and verifies the tab still exists.
    ///
    /// A persisted tab that no longer exists clears the session, so the
    /// failure self-corrects.
    async fn require_live_tab(&self) -> Result<TabId> {
        let Some(tab_id) = self.store.get().await? else {
            return Err(Error::NoActiveTab);
        };

        match self.host.tab_status(tab_id).await? {
            Some(_) => Ok(tab_id),
            None => {
                warn!(tab_id = %tab_id, "Crawl tab is gone, clearing session");
                self.store.clear().await?;
                Err(Error::tab_closed(tab_id))
            }
        }
    }

    /// Best-effort close and forget of a tab that failed to open.
    async fn abandon(&self, tab_id: TabId) {
        if let Err(err) = self.host.close_tab(tab_id).await {
            warn!(tab_id = %tab_id, error = %err, "Failed to close abandoned tab");
        }
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "Failed to clear session of abandoned tab");
        }
    }

    /// Clears the session when the removed tab is the crawl tab.
    async fn reconcile_removed(&self, tab_id: TabId) {
        match self.store.get().await {
            Ok(Some(current)) if current == tab_id => {
                info!(tab_id = %tab_id, "Crawl tab closed externally, clearing session");
                if let Err(err) = self.store.clear().await {
                    warn!(error = %err, "Failed to clear session after external close");
                }
            }
            Ok(_) => trace!(tab_id = %tab_id, "Unrelated tab removed"),
            Err(err) => warn!(error = %err, "Session read failed during removal event"),
        }
    }
}

impl fmt::Debug for Crawler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// URL Validation
// ============================================================================

/// Rejects crawl targets that are not plain web URLs.
fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|_| Error::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(Error::invalid_url(url)),
    }
}

// ============================================================================
// Tests
// ============================================================================
