//! WebSocket transport layer.
//!
//! This module handles communication between the host (Rust) and the
//! browser-side bridge running in the privileged page.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Host (Rust)    │                              │  Privileged     │
//! │                 │         WebSocket            │  page bridge    │
//! │  BridgeServer   │◄────────────────────────────►│                 │
//! │  → BridgeChannel│      localhost:PORT          │  WebSocket      │
//! │  → BridgeTabs   │                              │  client         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `BridgeServer::bind` - Bind the configured host address
//! 2. Privileged page loads, its bridge connects
//! 3. `BridgeServer::accept` - Upgrade and announce readiness
//! 4. `BridgeChannel` - Correlate tab commands, route inbound traffic
//! 5. `BridgeTabs` - Tab operations expressed over the channel
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | WebSocket channel and event loop |
//! | `server` | WebSocket server binding and acceptance |
//! | `tabs` | Tab operations over the bridge channel |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket channel and event loop.
pub mod channel;

/// WebSocket server for bridge communication.
pub mod server;

/// Tab operations over the bridge channel.
pub mod tabs;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::BridgeChannel;
pub use server::{BridgeServer, BridgeSession};
pub use tabs::BridgeTabs;
