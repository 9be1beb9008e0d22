//! Crawl request, reply, and tab command message types.
//!
//! Two request/reply pairs share the channel:
//!
//! - Crawl traffic: the requester sends a [`CrawlRequest`], the host
//!   answers with a [`CrawlReply`].
//! - Tab traffic: the host sends a [`CommandRequest`] wrapping a
//!   [`TabCommand`], the bridging layer answers with a [`CommandReply`].
//!
//! # Method Naming
//!
//! Methods follow `module.methodName` format:
//!
//! - `crawl.open`, `crawl.fetch`, `crawl.extract`, `crawl.close`,
//!   `crawl.fetchDirect`
//! - `system.ping`
//! - `tabs.create`, `tabs.navigate`, `tabs.remove`, `tabs.status`,
//!   `tabs.runSnippet`

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Supported Methods
// ============================================================================

/// Crawl methods this host answers, in the order they are announced.
pub const SUPPORTED_METHODS: [&str; 6] = [
    "crawl.open",
    "crawl.fetch",
    "crawl.extract",
    "crawl.close",
    "crawl.fetchDirect",
    "system.ping",
];

// ============================================================================
// CrawlRequest
// ============================================================================

/// A crawl request from the requester to the host.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "method": "crawl.fetch",
///   "params": { "url": "https://example.com/reports/1" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    /// Unique identifier echoed in the reply.
    pub id: RequestId,

    /// Request kind in `module.methodName` format.
    pub method: String,

    /// Request-specific data.
    #[serde(default)]
    pub params: Value,
}

impl CrawlRequest {
    /// Maps the request onto a crawl action.
    ///
    /// Returns `None` for methods this host does not own; those requests
    /// get no reply at all, so other listeners on the shared channel can
    /// answer them.
    ///
    /// Missing parameters map to empty values and are rejected by the
    /// operation itself, so a malformed known request still gets a reply.
    #[must_use]
    pub fn action(&self) -> Option<CrawlAction> {
        match self.method.as_str() {
            "crawl.open" => Some(CrawlAction::Open {
                url: self.get_string("url"),
            }),
            "crawl.fetch" => Some(CrawlAction::Fetch {
                url: self.get_string("url"),
            }),
            "crawl.extract" => Some(CrawlAction::Extract),
            "crawl.close" => Some(CrawlAction::Close),
            "crawl.fetchDirect" => Some(CrawlAction::FetchDirect {
                url: self.get_string("url"),
            }),
            "system.ping" => Some(CrawlAction::Ping),
            _ => None,
        }
    }

    /// Gets a string from params.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// CrawlAction
// ============================================================================

/// Typed crawl actions the dispatcher executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlAction {
    /// Open a fresh crawl tab at the URL.
    Open {
        /// Target URL.
        url: String,
    },

    /// Navigate the crawl tab and extract the rendered page.
    Fetch {
        /// Target URL.
        url: String,
    },

    /// Extract the crawl tab's current page without navigating.
    Extract,

    /// Close the crawl tab and forget the session.
    Close,

    /// Fetch a URL directly over HTTP, bypassing the tab.
    FetchDirect {
        /// Target URL.
        url: String,
    },

    /// Liveness probe.
    Ping,
}

// ============================================================================
// CrawlReply
// ============================================================================

/// A crawl reply from the host to the requester.
///
/// # Format
///
/// Success:
/// ```json
/// {
///   "id": "uuid",
///   "type": "success",
///   "result": { "html": "<html>..." }
/// }
/// ```
///
/// Error:
/// ```json
/// {
///   "id": "uuid",
///   "type": "error",
///   "error": "No active crawl tab"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReply {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Reply type.
    #[serde(rename = "type")]
    pub reply_type: ReplyType,

    /// Result data (if success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error description (if error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlReply {
    /// Creates a success reply with a result payload.
    #[inline]
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            reply_type: ReplyType::Success,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a success reply with an empty result.
    #[inline]
    #[must_use]
    pub fn empty(id: RequestId) -> Self {
        Self::success(id, json!({}))
    }

    /// Creates a success reply carrying extracted HTML.
    #[inline]
    #[must_use]
    pub fn html(id: RequestId, html: impl Into<String>) -> Self {
        Self::success(id, json!({ "html": html.into() }))
    }

    /// Creates an error reply.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, error: impl Into<String>) -> Self {
        Self {
            id,
            reply_type: ReplyType::Error,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Returns `true` if this is a success reply.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.reply_type == ReplyType::Success
    }
}

// ============================================================================
// ReplyType
// ============================================================================

/// Reply type discriminator, shared by both reply directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    /// Successful reply.
    Success,
    /// Error reply.
    Error,
}

// ============================================================================
// TabCommand
// ============================================================================

/// Tab commands sent to the bridging layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabCommand {
    /// Create a tab at the URL.
    #[serde(rename = "tabs.create")]
    Create {
        /// Initial URL.
        url: String,
    },

    /// Navigate an existing tab.
    #[serde(rename = "tabs.navigate")]
    Navigate {
        /// Target tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
        /// Target URL.
        url: String,
    },

    /// Close a tab.
    #[serde(rename = "tabs.remove")]
    Remove {
        /// Target tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },

    /// Query a tab's load status.
    #[serde(rename = "tabs.status")]
    Status {
        /// Target tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },

    /// Run a read-only snippet in a tab's top document.
    #[serde(rename = "tabs.runSnippet")]
    RunSnippet {
        /// Target tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
        /// Snippet source.
        code: String,
    },
}

// ============================================================================
// CommandRequest
// ============================================================================

/// A tab command request from the host to the bridging layer.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "method": "tabs.navigate",
///   "params": { "tabId": 1, "url": "https://example.com" }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest {
    /// Unique identifier for request/reply correlation.
    pub id: RequestId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: TabCommand,
}

impl CommandRequest {
    /// Creates a new command request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: TabCommand) -> Self {
        Self {
            id: RequestId::generate(),
            command,
        }
    }

    /// Creates a new command request with specific ID.
    #[inline]
    #[must_use]
    pub fn with_id(id: RequestId, command: TabCommand) -> Self {
        Self { id, command }
    }
}

// ============================================================================
// CommandReply
// ============================================================================

/// A tab command reply from the bridging layer to the host.
///
/// # Format
///
/// Success:
/// ```json
/// {
///   "id": "uuid",
///   "type": "success",
///   "result": { "tabId": 7 }
/// }
/// ```
///
/// Error:
/// ```json
/// {
///   "id": "uuid",
///   "type": "error",
///   "error": "no such tab",
///   "message": "Tab 7 does not exist"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CommandReply {
    /// Matches the command `id`.
    pub id: RequestId,

    /// Reply type.
    #[serde(rename = "type")]
    pub reply_type: ReplyType,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl CommandReply {
    /// Returns `true` if this is a success reply.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.reply_type == ReplyType::Success
    }

    /// Returns `true` if this is an error reply.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.reply_type == ReplyType::Error
    }

    /// Extracts the result value, returning error if the reply was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bridge`] with the remote message if the reply was
    /// an error.
    pub fn into_result(self) -> Result<Value> {
        match self.reply_type {
            ReplyType::Success => Ok(self.result.unwrap_or(Value::Null)),
            ReplyType::Error => {
                let error_code = self.error.unwrap_or_else(|| "unknown error".to_string());
                let message = self.message.unwrap_or_else(|| error_code.clone());
                Err(Error::bridge(message))
            }
        }
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a u64 value from the result.
    ///
    /// Returns 0 if key not found or not a number.
    #[inline]
    #[must_use]
    pub fn get_u64(&self, key: &str) -> u64 {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_u64())
            .unwrap_or_default()
    }

    /// Gets a boolean value from the result.
    ///
    /// Returns false if key not found or not a boolean.
    #[inline]
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_crawl_request_actions() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "method": "crawl.fetch",
            "params": { "url": "https://example.com/reports/1" }
        }"#;

        let request: CrawlRequest = serde_json::from_str(json_str).expect("parse");
        match request.action() {
            Some(CrawlAction::Fetch { url }) => {
                assert_eq!(url, "https://example.com/reports/1");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_crawl_request_without_params() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "method": "crawl.close"
        }"#;

        let request: CrawlRequest = serde_json::from_str(json_str).expect("parse");
        assert_eq!(request.action(), Some(CrawlAction::Close));
    }

    #[test]
    fn test_crawl_request_missing_url_maps_to_empty() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "method": "crawl.open",
            "params": {}
        }"#;

        let request: CrawlRequest = serde_json::from_str(json_str).expect("parse");
        assert_eq!(
            request.action(),
            Some(CrawlAction::Open { url: String::new() })
        );
    }

    #[test]
    fn test_unknown_method_has_no_action() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "method": "captcha.solve",
            "params": {}
        }"#;

        let request: CrawlRequest = serde_json::from_str(json_str).expect("parse");
        assert!(request.action().is_none());
    }

    #[test]
    fn test_crawl_reply_success_shape() {
        let id = RequestId::generate();
        let reply = CrawlReply::html(id, "<html></html>");
        let value = serde_json::to_value(&reply).expect("serialize");

        assert_eq!(value["type"], "success");
        assert_eq!(value["result"]["html"], "<html></html>");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_crawl_reply_empty_shape() {
        let id = RequestId::generate();
        let value = serde_json::to_value(CrawlReply::empty(id)).expect("serialize");

        assert_eq!(value["type"], "success");
        assert_eq!(value["result"], json!({}));
    }

    #[test]
    fn test_crawl_reply_error_shape() {
        let id = RequestId::generate();
        let reply = CrawlReply::failure(id, "No active crawl tab");
        let value = serde_json::to_value(&reply).expect("serialize");

        assert_eq!(value["type"], "error");
        assert_eq!(value["error"], "No active crawl tab");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_command_request_serialization() {
        let tab_id = TabId::new(1).expect("valid tab id");
        let command = TabCommand::Navigate {
            tab_id,
            url: "https://example.com".to_string(),
        };

        let request = CommandRequest::new(command);
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(value["method"], "tabs.navigate");
        assert_eq!(value["params"]["tabId"], 1);
        assert_eq!(value["params"]["url"], "https://example.com");
    }

    #[test]
    fn test_command_request_with_id() {
        let id = RequestId::generate();
        let request = CommandRequest::with_id(
            id,
            TabCommand::Create {
                url: "https://example.com".to_string(),
            },
        );
        assert_eq!(request.id, id);
    }

    #[test]
    fn test_success_command_reply() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": { "tabId": 7 }
        }"#;

        let reply: CommandReply = serde_json::from_str(json_str).expect("parse");
        assert!(reply.is_success());
        assert!(!reply.is_error());
        assert_eq!(reply.get_u64("tabId"), 7);
    }

    #[test]
    fn test_error_command_reply_into_result() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "error",
            "error": "no such tab",
            "message": "Tab 7 does not exist"
        }"#;

        let reply: CommandReply = serde_json::from_str(json_str).expect("parse");
        assert!(reply.is_error());

        let err = reply.into_result().expect_err("should be error");
        assert_eq!(err.to_string(), "Bridge error: Tab 7 does not exist");
    }

    #[test]
    fn test_command_reply_get_helpers() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": {
                "status": "complete",
                "tabId": 42,
                "exists": true
            }
        }"#;

        let reply: CommandReply = serde_json::from_str(json_str).expect("parse");
        assert_eq!(reply.get_string("status"), "complete");
        assert_eq!(reply.get_u64("tabId"), 42);
        assert!(reply.get_bool("exists"));

        // Missing keys return defaults
        assert_eq!(reply.get_string("missing"), "");
        assert_eq!(reply.get_u64("missing"), 0);
        assert!(!reply.get_bool("missing"));
    }

    #[test]
    fn test_supported_methods_all_map() {
        for method in SUPPORTED_METHODS {
            let request = CrawlRequest {
                id: RequestId::generate(),
                method: method.to_string(),
                params: json!({ "url": "https://example.com" }),
            };
            assert!(request.action().is_some(), "{method} should map");
        }
    }

    proptest! {
        #[test]
        fn test_unlisted_methods_never_map(method in "[a-z]{1,12}\\.[a-zA-Z]{1,16}") {
            prop_assume!(!SUPPORTED_METHODS.contains(&method.as_str()));

            let request = CrawlRequest {
                id: RequestId::generate(),
                method,
                params: Value::Null,
            };
            prop_assert!(request.action().is_none());
        }
    }
}
