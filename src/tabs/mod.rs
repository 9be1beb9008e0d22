//! Browser tab access and load tracking.
//!
//! The orchestrator never talks to a browser directly; it goes through the
//! [`TabHost`] trait. Production wires the trait to the bridge channel,
//! tests wire it to a scripted in-memory host.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `waiter` | Load-completion waiting with timeout |
//! | `extract` | Page content serialization |

// ============================================================================
// Submodules
// ============================================================================

/// Load-completion waiting.
pub mod waiter;

/// Page content serialization.
pub mod extract;

// ============================================================================
// Re-exports
// ============================================================================

pub use extract::Extractor;
pub use waiter::{LoadWait, LoadWaiter};

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::TabId;
use crate::protocol::TabStatus;

// ============================================================================
// TabHost
// ============================================================================

/// The browser tab operations the crawl orchestrator consumes.
///
/// Implementations are expected to be cheap to share behind an `Arc`; the
/// orchestrator holds one for the lifetime of a bridge connection.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Creates a tab at the URL and returns its handle.
    async fn open_tab(&self, url: &str) -> Result<TabId>;

    /// Navigates an existing tab to the URL.
    ///
    /// Navigation completion is signalled separately through tab status
    /// events; this only confirms the command was accepted.
    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()>;

    /// Closes a tab.
    async fn close_tab(&self, tab_id: TabId) -> Result<()>;

    /// Queries a tab's load status.
    ///
    /// Returns `None` when the tab does not exist.
    async fn tab_status(&self, tab_id: TabId) -> Result<Option<TabStatus>>;

    /// Runs a read-only snippet in the tab's top document.
    ///
    /// Returns the snippet's string result, or `None` when it produced
    /// nothing.
    async fn run_snippet(&self, tab_id: TabId, code: &str) -> Result<Option<String>>;
}
