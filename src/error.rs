//! Error types for the tab crawler.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use tab_crawler::{Result, Error};
//!
//! async fn example(crawler: &Crawler) -> Result<()> {
//!     crawler.open("https://example.com/login").await?;
//!     let html = crawler.fetch("https://example.com/reports/1").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Session | [`Error::NoActiveTab`], [`Error::TabClosed`] |
//! | Navigation | [`Error::OpenFailed`], [`Error::LoadTimeout`] |
//! | Extraction | [`Error::ExtractionFailed`] |
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Bridge | [`Error::Bridge`], [`Error::BridgeClosed`], [`Error::CommandTimeout`], [`Error::Protocol`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Direct-fetch failures (HTTP status, content type, deadline) are not
//! [`Error`] variants; they are reported in-band as
//! [`FetchOutcome`](crate::fetch::FetchOutcome) payloads.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session Errors
    // ========================================================================
    /// No crawl tab is active.
    ///
    /// Returned when fetch or extract is requested before open, or after
    /// the crawl session was closed.
    #[error("No active crawl tab")]
    NoActiveTab,

    /// The crawl tab no longer exists.
    ///
    /// Returned when the persisted tab was closed outside the crawler.
    /// Detection clears the stored session, so the next open starts clean.
    #[error("Crawl tab {tab_id} is closed")]
    TabClosed {
        /// The tab that disappeared.
        tab_id: TabId,
    },

    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// Opening the crawl tab failed.
    ///
    /// Returned when the newly created tab does not finish loading within
    /// the load timeout.
    #[error("Failed to open crawl tab for {url}")]
    OpenFailed {
        /// URL the tab was opened with.
        url: String,
    },

    /// Navigation did not complete in time.
    ///
    /// Returned when no load-complete notification arrives within the
    /// load timeout.
    #[error("Tab {tab_id} did not finish loading after {timeout_ms}ms")]
    LoadTimeout {
        /// Tab being waited on.
        tab_id: TabId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Extraction Errors
    // ========================================================================
    /// Content extraction produced no result.
    ///
    /// Returned when the serialization snippet yields nothing, typically
    /// because the page forbids script injection.
    #[error("Content extraction failed in tab {tab_id}")]
    ExtractionFailed {
        /// Tab the extraction ran in.
        tab_id: TabId,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when host configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Crawl target URL is not usable.
    ///
    /// Returned for unparsable URLs and for schemes other than http/https.
    #[error("Invalid crawl URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    // ========================================================================
    // Bridge Errors
    // ========================================================================
    /// Bridge channel failure.
    ///
    /// Returned when sending over the bridge fails or the remote end
    /// reports a command error.
    #[error("Bridge error: {message}")]
    Bridge {
        /// Description of the bridge error.
        message: String,
    },

    /// Bridge connection closed unexpectedly.
    ///
    /// Returned when the channel is lost during operation.
    #[error("Bridge connection closed")]
    BridgeClosed,

    /// Tab command timed out.
    ///
    /// Returned when the bridge does not answer a command in time.
    #[error("Command {request_id} timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// The command that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Protocol violation or unexpected reply shape.
    ///
    /// Returned when a bridge message cannot be decoded as expected.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a tab closed error.
    #[inline]
    pub fn tab_closed(tab_id: TabId) -> Self {
        Self::TabClosed { tab_id }
    }

    /// Creates an open failed error.
    #[inline]
    pub fn open_failed(url: impl Into<String>) -> Self {
        Self::OpenFailed { url: url.into() }
    }

    /// Creates a load timeout error.
    #[inline]
    pub fn load_timeout(tab_id: TabId, timeout_ms: u64) -> Self {
        Self::LoadTimeout { tab_id, timeout_ms }
    }

    /// Creates an extraction failed error.
    #[inline]
    pub fn extraction_failed(tab_id: TabId) -> Self {
        Self::ExtractionFailed { tab_id }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a bridge error.
    #[inline]
    pub fn bridge(message: impl Into<String>) -> Self {
        Self::Bridge {
            message: message.into(),
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn command_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::CommandTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::LoadTimeout { .. } | Self::CommandTimeout { .. }
        )
    }

    /// Returns `true` if this is a session error.
    ///
    /// Session errors mean the crawl has no usable tab; the caller must
    /// open again before fetching.
    #[inline]
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        matches!(self, Self::NoActiveTab | Self::TabClosed { .. })
    }

    /// Returns `true` if this is a bridge error.
    #[inline]
    #[must_use]
    pub fn is_bridge_error(&self) -> bool {
        matches!(
            self,
            Self::Bridge { .. }
                | Self::BridgeClosed
                | Self::CommandTimeout { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed { .. } | Self::LoadTimeout { .. } | Self::CommandTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
