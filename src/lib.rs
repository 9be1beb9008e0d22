//! Tab Crawler - Browser-assisted page crawling host.
//!
//! This library runs the privileged half of a crawl setup: a WebSocket
//! host that a browser-side bridge connects to, driving a single crawl
//! tab on its behalf.
//!
//! # Architecture
//!
//! The host follows a client-server model:
//!
//! - **Host (Rust)**: Answers crawl requests, issues tab commands
//! - **Bridge (browser)**: Executes tab commands in the privileged page,
//!   emits tab events
//!
//! Key design principles:
//!
//! - One crawl tab at a time; its handle persists in a [`SessionStore`]
//!   so the session survives host restarts
//! - Protocol uses `module.methodName` format on every frame
//! - Event-driven load waiting (no status polling loops)
//! - Unknown request kinds are left unanswered for other listeners on
//!   the shared channel
//!
//! # Quick Start
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use tab_crawler::{CrawlHost, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let host = CrawlHost::builder()
//!         .store_path("./crawl-session.json")
//!         .build()?;
//!
//!     // Serves bridge connections until the process exits
//!     host.serve(IpAddr::V4(Ipv4Addr::LOCALHOST), 9222).await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`crawler`] | The crawl tab orchestrator |
//! | [`dispatch`] | Request-to-operation dispatching |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`fetch`] | Direct HTTP fetch fallback |
//! | [`host`] | Host lifecycle: [`CrawlHost`], builder, configuration |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebSocket message types |
//! | [`store`] | Persistent session store |
//! | [`tabs`] | Tab host seam, load waiting, content extraction |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// The crawl tab orchestrator.
///
/// [`Crawler`] owns the open/fetch/extract/close lifecycle of the
/// single crawl tab.
pub mod crawler;

/// Request-to-operation dispatching.
///
/// Maps inbound crawl requests onto orchestrator operations and folds
/// failures into error replies.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Direct HTTP fetch fallback.
///
/// Fetches pages without a tab when rendering is not needed.
pub mod fetch;

/// Host lifecycle and configuration.
///
/// Use [`CrawlHost::builder()`] to create a configured host instance.
pub mod host;

/// Type-safe identifiers for crawl entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// WebSocket protocol message types.
///
/// Defines the request/reply/command/event structures on the wire.
pub mod protocol;

/// Persistent session store.
///
/// Holds the active tab handle across host restarts.
pub mod store;

/// Tab host seam, load waiting, and content extraction.
pub mod tabs;

/// WebSocket transport layer.
///
/// WebSocket server, bridge channel, and the wire-backed tab host.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Host types
pub use host::{CrawlConfig, CrawlHost, CrawlHostBuilder};

// Orchestration types
pub use crawler::Crawler;
pub use dispatch::Dispatcher;
pub use fetch::{DirectFetcher, FetchOutcome};
pub use store::SessionStore;
pub use tabs::{Extractor, LoadWaiter, TabHost};

// Transport types
pub use transport::{BridgeChannel, BridgeServer, BridgeSession, BridgeTabs};

// Protocol types
pub use protocol::{
    CrawlAction, CrawlReply, CrawlRequest, ParsedTabEvent, ReadyEvent, ReplyType, TabEvent,
    TabStatus,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, TabId};
