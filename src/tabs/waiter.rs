//! Load-completion waiting.
//!
//! Navigation completion arrives as a pushed status event, not as the
//! return value of the navigate command. [`LoadWaiter`] bridges the two: an
//! operation registers a wait for its tab before triggering navigation,
//! the event pump resolves it when the matching complete event arrives,
//! and a timeout bounds the whole thing.
//!
//! Registrations are released on every exit path. A wait that times out,
//! errors, or is dropped removes itself from the table, so a late event
//! finds no receiver and is discarded instead of leaking one.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::TabId;

// ============================================================================
// PendingWait
// ============================================================================

/// One registered wait.
///
/// The sequence number ties a table entry to the guard that created it, so
/// a guard that was superseded cannot release its successor's entry.
#[derive(Debug)]
struct PendingWait {
    seq: u64,
    tx: oneshot::Sender<()>,
}

// ============================================================================
// LoadWaiter
// ============================================================================

/// Table of pending load waits, keyed by tab.
///
/// At most one wait is live per tab; registering again supersedes the
/// previous wait, which then resolves with a channel error.
#[derive(Debug, Default)]
pub struct LoadWaiter {
    /// Pending waits by tab.
    waits: Mutex<FxHashMap<TabId, PendingWait>>,

    /// Registration sequence counter.
    next_seq: AtomicU64,
}

impl LoadWaiter {
    /// Creates an empty waiter table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wait for the tab's next load completion.
    ///
    /// Register before triggering the navigation; a completion that fires
    /// in between is then buffered instead of lost.
    #[must_use]
    pub fn begin(&self, tab_id: TabId) -> LoadWait<'_> {
        let (tx, rx) = oneshot::channel();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let superseded = self
            .waits
            .lock()
            .insert(tab_id, PendingWait { seq, tx })
            .is_some();
        if superseded {
            debug!(tab_id = %tab_id, "Superseded pending load wait");
        }

        LoadWait {
            waiter: self,
            tab_id,
            seq,
            rx: Some(rx),
        }
    }

    /// Resolves the pending wait for a tab that finished loading.
    ///
    /// Returns `false` when no wait is registered; late and stale events
    /// land here and are dropped.
    pub fn notify_complete(&self, tab_id: TabId) -> bool {
        let Some(pending) = self.waits.lock().remove(&tab_id) else {
            trace!(tab_id = %tab_id, "Load complete with no pending wait");
            return false;
        };
        pending.tx.send(()).is_ok()
    }

    /// Drops every registration.
    ///
    /// In-flight waits resolve with a channel error. Called when the
    /// bridge connection is lost.
    pub fn fail_pending(&self) {
        let mut waits = self.waits.lock();
        if !waits.is_empty() {
            debug!(count = waits.len(), "Failing pending load waits");
        }
        waits.clear();
    }

    /// Number of registered waits.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.waits.lock().len()
    }

    /// Removes a registration if it still belongs to the given guard.
    fn release(&self, tab_id: TabId, seq: u64) {
        let mut waits = self.waits.lock();
        if waits.get(&tab_id).is_some_and(|pending| pending.seq == seq) {
            waits.remove(&tab_id);
        }
    }
}

// ============================================================================
// LoadWait
// ============================================================================

/// A registered wait for one tab's load completion.
///
/// Dropping the guard releases the registration, whether or not `wait`
/// ran to completion.
#[derive(Debug)]
pub struct LoadWait<'a> {
    waiter: &'a LoadWaiter,
    tab_id: TabId,
    seq: u64,
    rx: Option<oneshot::Receiver<()>>,
}

impl LoadWait<'_> {
    /// Waits until the tab reports load completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoadTimeout`] when no completion arrives within
    /// `timeout`, and [`Error::ChannelClosed`] when the wait was
    /// superseded or the waiter failed all pending waits.
    pub async fn wait(mut self, timeout: Duration) -> Result<()> {
        let rx = self
            .rx
            .take()
            .ok_or_else(|| Error::protocol("Load wait polled twice"))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(Error::load_timeout(self.tab_id, timeout.as_millis() as u64)),
        }
    }
}

impl Drop for LoadWait<'_> {
    fn drop(&mut self) {
        self.waiter.release(self.tab_id, self.seq);
    }
}

// ============================================================================
// Tests
// ============================================================================
