//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between the
//! host (Rust) and its two collaborators on the bridge channel: the
//! requester issuing crawl commands and the bridging layer relaying
//! browser tab traffic.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`CrawlRequest`] | Requester → Host | Crawl command |
//! | [`CrawlReply`] | Host → Requester | Crawl result or error |
//! | [`CommandRequest`] | Host → Bridge | Tab command |
//! | [`CommandReply`] | Bridge → Host | Tab command result |
//! | [`TabEvent`] | Bridge → Host | Browser tab notification |
//! | [`ReadyEvent`] | Host → Bridge | Capability announcement |
//!
//! # Method Naming
//!
//! Methods follow `module.methodName` format:
//!
//! - `crawl.fetch`
//! - `tabs.navigate`
//! - `system.ping`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Crawl and tab command request/reply types |
//! | `event` | Tab event and ready announcement types |

// ============================================================================
// Submodules
// ============================================================================

/// Crawl and tab command request/reply types.
pub mod message;

/// Tab event message types.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{ParsedTabEvent, ReadyEvent, TabEvent, TabStatus};
pub use message::{
    CommandReply, CommandRequest, CrawlAction, CrawlReply, CrawlRequest, ReplyType,
    SUPPORTED_METHODS, TabCommand,
};
