//! Tab event message types.
//!
//! Events are notifications sent from the bridging layer to the host when
//! browser tab activity occurs. They carry no reply channel; the host
//! applies them and moves on.
//!
//! # Event Types
//!
//! | Module | Events |
//! |--------|--------|
//! | `tabs` | `statusChanged`, `removed` |
//! | `system` | `ready` (outbound, host to bridge) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Error;
use crate::protocol::message::SUPPORTED_METHODS;

// ============================================================================
// TabEvent
// ============================================================================

/// An event notification from the bridging layer to the host.
///
/// # Format
///
/// ```json
/// {
///   "type": "event",
///   "method": "tabs.statusChanged",
///   "params": { "tabId": 1, "status": "complete" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TabEvent {
    /// Event type marker (always "event").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl TabEvent {
    /// Returns the module name from the method.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedTabEvent {
        match self.method.as_str() {
            "tabs.statusChanged" => match self.get_string("status").parse::<TabStatus>() {
                Ok(status) => ParsedTabEvent::StatusChanged {
                    tab_id: self.get_u32("tabId"),
                    status,
                },
                Err(_) => self.unknown(),
            },

            "tabs.removed" => ParsedTabEvent::Removed {
                tab_id: self.get_u32("tabId"),
            },

            _ => self.unknown(),
        }
    }

    #[inline]
    fn unknown(&self) -> ParsedTabEvent {
        ParsedTabEvent::Unknown {
            method: self.method.clone(),
            params: self.params.clone(),
        }
    }

    /// Gets a string from params.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a u32 from params.
    #[inline]
    fn get_u32(&self, key: &str) -> u32 {
        self.params
            .get(key)
            .and_then(|v| v.as_u64())
            .unwrap_or_default() as u32
    }
}

// ============================================================================
// ParsedTabEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum ParsedTabEvent {
    /// A tab's load status changed.
    StatusChanged {
        /// Tab ID as reported by the browser.
        tab_id: u32,
        /// New load status.
        status: TabStatus,
    },

    /// A tab was closed.
    Removed {
        /// Tab ID as reported by the browser.
        tab_id: u32,
    },

    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// TabStatus
// ============================================================================

/// Load status of a browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    /// The tab is still loading.
    Loading,
    /// The tab finished loading.
    Complete,
}

impl TabStatus {
    /// Returns the wire representation.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Complete => "complete",
        }
    }
}

impl FromStr for TabStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loading" => Ok(Self::Loading),
            "complete" => Ok(Self::Complete),
            other => Err(Error::protocol(format!("Unknown tab status: {other}"))),
        }
    }
}

impl fmt::Display for TabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ReadyEvent
// ============================================================================

/// The capability announcement broadcast once per bridge connection.
///
/// # Format
///
/// ```json
/// {
///   "type": "event",
///   "method": "system.ready",
///   "params": { "methods": ["crawl.open", "..."] }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ReadyEvent {
    /// Event type marker (always "event").
    #[serde(rename = "type")]
    pub event_type: &'static str,

    /// Event name.
    pub method: &'static str,

    /// Announced capabilities.
    pub params: Value,
}

impl ReadyEvent {
    /// Creates the announcement listing every supported crawl method.
    #[inline]
    #[must_use]
    pub fn announce() -> Self {
        Self {
            event_type: "event",
            method: "system.ready",
            params: json!({ "methods": SUPPORTED_METHODS }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
