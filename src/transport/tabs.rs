//! Tab operations over the bridge channel.
//!
//! [`BridgeTabs`] is the wire-backed [`TabHost`]: every operation
//! serializes a tab command, waits for the correlated reply, and decodes
//! the payload into host types. The decoders are plain functions so the
//! reply shapes can be tested without a live channel.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::protocol::{CommandReply, TabCommand, TabStatus};
use crate::tabs::TabHost;

use super::BridgeChannel;

// ============================================================================
// BridgeTabs
// ============================================================================

/// [`TabHost`] backed by the WebSocket bridge.
#[derive(Debug, Clone)]
pub struct BridgeTabs {
    /// Channel to the browser-side bridge.
    channel: BridgeChannel,
    /// Timeout applied to every tab command.
    command_timeout: Duration,
}

impl BridgeTabs {
    /// Creates a tab host over a bridge channel.
    #[inline]
    #[must_use]
    pub fn new(channel: BridgeChannel, command_timeout: Duration) -> Self {
        Self {
            channel,
            command_timeout,
        }
    }

    /// Sends one tab command with the configured timeout.
    async fn command(&self, command: TabCommand) -> Result<CommandReply> {
        self.channel
            .command_with_timeout(command, self.command_timeout)
            .await
    }
}

#[async_trait]
impl TabHost for BridgeTabs {
    async fn open_tab(&self, url: &str) -> Result<TabId> {
        let reply = self
            .command(TabCommand::Create {
                url: url.to_string(),
            })
            .await?;
        decode_created(reply)
    }

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()> {
        let reply = self
            .command(TabCommand::Navigate {
                tab_id,
                url: url.to_string(),
            })
            .await?;
        reply.into_result()?;
        Ok(())
    }

    async fn close_tab(&self, tab_id: TabId) -> Result<()> {
        let reply = self.command(TabCommand::Remove { tab_id }).await?;
        reply.into_result()?;
        Ok(())
    }

    async fn tab_status(&self, tab_id: TabId) -> Result<Option<TabStatus>> {
        let reply = self.command(TabCommand::Status { tab_id }).await?;
        decode_status(reply)
    }

    async fn run_snippet(&self, tab_id: TabId, code: &str) -> Result<Option<String>> {
        let reply = self
            .command(TabCommand::RunSnippet {
                tab_id,
                code: code.to_string(),
            })
            .await?;
        decode_snippet(reply)
    }
}

// ============================================================================
// Reply decoding
// ============================================================================

/// Decodes a `tabs.create` reply into the new tab's ID.
fn decode_created(reply: CommandReply) -> Result<TabId> {
    let raw = reply.get_u64("tabId");
    reply.into_result()?;

    u32::try_from(raw)
        .ok()
        .and_then(TabId::new)
        .ok_or_else(|| Error::protocol(format!("Bridge returned invalid tab id: {raw}")))
}

/// Decodes a `tabs.status` reply.
///
/// `exists: false` means the tab is gone; the status field is only
/// meaningful when the tab exists.
fn decode_status(reply: CommandReply) -> Result<Option<TabStatus>> {
    let exists = reply.get_bool("exists");
    let status = reply.get_string("status");
    reply.into_result()?;

    if !exists {
        return Ok(None);
    }
    Ok(Some(status.parse()?))
}

/// Decodes a `tabs.runSnippet` reply.
///
/// A missing or null `value` means the snippet produced no result.
fn decode_snippet(reply: CommandReply) -> Result<Option<String>> {
    let value = reply.into_result()?;
    Ok(value
        .get("value")
        .and_then(Value::as_str)
        .map(str::to_string))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(json: &str) -> CommandReply {
        serde_json::from_str(json).expect("parse reply")
    }

    #[test]
    fn test_decode_created() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "tabId": 12 }
            }"#,
        );

        let tab_id = decode_created(reply).expect("tab id");
        assert_eq!(tab_id.get(), 12);
    }

    #[test]
    fn test_decode_created_error_reply() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "error",
                "error": "tab_error",
                "message": "could not create tab"
            }"#,
        );

        let err = decode_created(reply).expect_err("should fail");
        assert!(err.to_string().contains("could not create tab"));
    }

    #[test]
    fn test_decode_created_rejects_zero_id() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "tabId": 0 }
            }"#,
        );

        let err = decode_created(reply).expect_err("should fail");
        assert!(err.to_string().contains("invalid tab id"));
    }

    #[test]
    fn test_decode_status_complete() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "exists": true, "status": "complete" }
            }"#,
        );

        let status = decode_status(reply).expect("status");
        assert_eq!(status, Some(TabStatus::Complete));
    }

    #[test]
    fn test_decode_status_loading() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "exists": true, "status": "loading" }
            }"#,
        );

        let status = decode_status(reply).expect("status");
        assert_eq!(status, Some(TabStatus::Loading));
    }

    #[test]
    fn test_decode_status_missing_tab() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "exists": false }
            }"#,
        );

        let status = decode_status(reply).expect("status");
        assert_eq!(status, None);
    }

    #[test]
    fn test_decode_status_unknown_string() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "exists": true, "status": "interactive" }
            }"#,
        );

        let err = decode_status(reply).expect_err("should fail");
        assert!(err.to_string().contains("Unknown tab status"));
    }

    #[test]
    fn test_decode_snippet_value() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "value": "<html></html>" }
            }"#,
        );

        let value = decode_snippet(reply).expect("snippet");
        assert_eq!(value.as_deref(), Some("<html></html>"));
    }

    #[test]
    fn test_decode_snippet_null_value() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "success",
                "result": { "value": null }
            }"#,
        );

        let value = decode_snippet(reply).expect("snippet");
        assert_eq!(value, None);
    }

    #[test]
    fn test_decode_snippet_error_reply() {
        let reply = reply(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "type": "error",
                "error": "script_error",
                "message": "snippet threw"
            }"#,
        );

        let err = decode_snippet(reply).expect_err("should fail");
        assert!(err.to_string().contains("snippet threw"));
    }
}
