//! Persistent crawl session store.
//!
//! The crawl session is one fact: which browser tab is the crawl tab. It
//! lives in a small JSON file so the session survives host restarts; every
//! orchestrator operation re-reads it instead of caching it in memory.
//!
//! # File Format
//!
//! ```json
//! { "crawlTabId": 7 }
//! ```
//!
//! An absent file means no session. Unreadable content is logged and
//! treated the same way, so a corrupt record can never wedge the host.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::Result;
use crate::identifiers::TabId;

// ============================================================================
// SessionRecord
// ============================================================================

/// On-disk shape of the session file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SessionRecord {
    /// The active crawl tab.
    #[serde(rename = "crawlTabId")]
    crawl_tab_id: TabId,
}

// ============================================================================
// SessionStore
// ============================================================================

/// File-backed store of the single crawl tab handle.
///
/// All operations are async and must complete before the caller proceeds;
/// `set` in particular is awaited before any load wait so a restart cannot
/// orphan a freshly opened tab.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Session file location.
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store over the given session file path.
    ///
    /// The file itself is created lazily on the first `set`.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the session file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted crawl tab, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file exists but
    /// cannot be read. Content that cannot be decoded reads as `None`.
    pub async fn get(&self) -> Result<Option<TabId>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<SessionRecord>(&bytes) {
            Ok(record) => Ok(Some(record.crawl_tab_id)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Session file unreadable, treating as no session"
                );
                Ok(None)
            }
        }
    }

    /// Persists the crawl tab durably.
    ///
    /// Writes a sibling temp file and renames it into place, so a crash
    /// mid-write leaves either the old record or the new one, never a
    /// torn file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the write or rename
    /// fails.
    pub async fn set(&self, tab_id: TabId) -> Result<()> {
        let record = SessionRecord {
            crawl_tab_id: tab_id,
        };
        let bytes = serde_json::to_vec_pretty(&record)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!(tab_id = %tab_id, path = %self.path.display(), "Session persisted");
        Ok(())
    }

    /// Removes the persisted session.
    ///
    /// Clearing an already-empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file exists but
    /// cannot be removed.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
