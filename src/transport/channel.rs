//! WebSocket channel and event loop.
//!
//! This module owns the WebSocket conversation with the browser-side
//! bridge: command/reply correlation, routing of inbound crawl requests
//! and tab events, and outbound reply frames.
//!
//! # Event Loop
//!
//! The channel spawns a tokio task that handles:
//!
//! - Incoming frames from the bridge (command replies, tab events, crawl
//!   requests)
//! - Outgoing tab commands from the Rust API
//! - Command/reply correlation by UUID
//!
//! Inbound crawl requests and tab events are not handled here; they are
//! forwarded on channels handed out by [`BridgeChannel::spawn`] so the
//! host can drive them at its own pace.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{
    CommandReply, CommandRequest, CrawlReply, CrawlRequest, ReadyEvent, TabCommand, TabEvent,
};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for tab command execution.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending tab commands before rejecting new ones.
const MAX_PENDING_COMMANDS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Map of command request IDs to reply channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<CommandReply>>>;

// ============================================================================
// ChannelCommand
// ============================================================================

/// Internal commands for the event loop.
enum ChannelCommand {
    /// Send a tab command and wait for its reply.
    Send {
        request: CommandRequest,
        reply_tx: oneshot::Sender<Result<CommandReply>>,
    },
    /// Send a pre-serialized frame with no reply expected.
    SendFrame(String),
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Shutdown the channel.
    Shutdown,
}

// ============================================================================
// BridgeChannel
// ============================================================================

/// WebSocket channel to the browser-side bridge.
///
/// Handles command/reply correlation and routes inbound traffic.
/// The channel spawns an internal event loop task.
///
/// # Thread Safety
///
/// `BridgeChannel` is `Send + Sync` and can be shared across tasks.
/// Handles are cloned freely; dropping one does not stop the event
/// loop. Call [`shutdown`](Self::shutdown) to stop it explicitly.
pub struct BridgeChannel {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ChannelCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
}

impl Clone for BridgeChannel {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
        }
    }
}

impl BridgeChannel {
    /// Creates a channel from a WebSocket stream and spawns its event loop.
    ///
    /// Returns the channel handle together with the receivers for inbound
    /// crawl requests and tab events. Both receivers close when the
    /// WebSocket connection ends.
    pub(crate) fn spawn(
        ws_stream: WebSocketStream<TcpStream>,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<CrawlRequest>,
        mpsc::UnboundedReceiver<TabEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            requests_tx,
            events_tx,
        ));

        (
            Self {
                command_tx,
                correlation,
            },
            requests_rx,
            events_rx,
        )
    }

    /// Sends a tab command and waits for its reply with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::BridgeClosed`] if the channel is closed
    /// - [`Error::CommandTimeout`] if no reply arrives within the timeout
    /// - [`Error::Protocol`] if too many commands are pending
    pub async fn command(&self, command: TabCommand) -> Result<CommandReply> {
        self.command_with_timeout(command, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a tab command and waits for its reply with a custom timeout.
    ///
    /// # Arguments
    ///
    /// * `command` - The tab command to send
    /// * `command_timeout` - Maximum time to wait for the reply
    ///
    /// # Errors
    ///
    /// - [`Error::BridgeClosed`] if the channel is closed
    /// - [`Error::CommandTimeout`] if no reply arrives within the timeout
    /// - [`Error::Protocol`] if too many commands are pending
    pub async fn command_with_timeout(
        &self,
        command: TabCommand,
        command_timeout: Duration,
    ) -> Result<CommandReply> {
        // Check pending command limit
        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_COMMANDS {
                warn!(
                    pending = correlation.len(),
                    max = MAX_PENDING_COMMANDS,
                    "Too many pending commands"
                );
                return Err(Error::protocol(format!(
                    "Too many pending commands: {}/{}",
                    correlation.len(),
                    MAX_PENDING_COMMANDS
                )));
            }
        }

        let request = CommandRequest::new(command);
        let request_id = request.id;

        // Create reply channel
        let (reply_tx, reply_rx) = oneshot::channel();

        // Send command to event loop
        self.command_tx
            .send(ChannelCommand::Send { request, reply_tx })
            .map_err(|_| Error::BridgeClosed)?;

        // Wait for reply with timeout
        match timeout(command_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::BridgeClosed),
            Err(_) => {
                // Timeout - clean up correlation entry
                let _ = self
                    .command_tx
                    .send(ChannelCommand::RemoveCorrelation(request_id));

                Err(Error::command_timeout(
                    request_id,
                    command_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Sends a reply to a crawl request.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the reply fails to serialize
    /// - [`Error::BridgeClosed`] if the channel is closed
    pub fn send_reply(&self, reply: &CrawlReply) -> Result<()> {
        self.send_frame(to_string(reply)?)
    }

    /// Sends the ready announcement.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the announcement fails to serialize
    /// - [`Error::BridgeClosed`] if the channel is closed
    pub fn send_ready(&self, ready: &ReadyEvent) -> Result<()> {
        self.send_frame(to_string(ready)?)
    }

    /// Queues a serialized frame for sending.
    fn send_frame(&self, frame: String) -> Result<()> {
        self.command_tx
            .send(ChannelCommand::SendFrame(frame))
            .map_err(|_| Error::BridgeClosed)
    }

    /// Returns the number of pending tab commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Shuts down the channel gracefully.
    ///
    /// Handles are cloned across tasks, so dropping one never implies
    /// shutdown; it must be requested explicitly.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ChannelCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WebSocketStream<TcpStream>,
        mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        requests_tx: mpsc::UnboundedSender<CrawlRequest>,
        events_tx: mpsc::UnboundedSender<TabEvent>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the bridge
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(
                                &text,
                                &correlation,
                                &requests_tx,
                                &events_tx,
                            );
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ChannelCommand::Send { request, reply_tx }) => {
                            Self::handle_send_command(
                                request,
                                reply_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ChannelCommand::SendFrame(frame)) => {
                            if let Err(e) = ws_write.send(Message::Text(frame.into())).await {
                                warn!(error = %e, "Failed to send frame");
                            }
                        }

                        Some(ChannelCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(?request_id, "Removed timed-out correlation");
                        }

                        Some(ChannelCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Fail all pending commands on shutdown
        Self::fail_pending_commands(&correlation);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text frame from the bridge.
    ///
    /// Frames are classified by shape: command replies carry a
    /// success/error `type`, tab events carry `type: "event"`, and crawl
    /// requests carry a method but no `type` at all.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        requests_tx: &mpsc::UnboundedSender<CrawlRequest>,
        events_tx: &mpsc::UnboundedSender<TabEvent>,
    ) {
        // Try to parse as CommandReply first
        if let Ok(reply) = from_str::<CommandReply>(text) {
            let tx = correlation.lock().remove(&reply.id);

            if let Some(tx) = tx {
                let _ = tx.send(Ok(reply));
            } else {
                // Replies can arrive after their command already timed out
                debug!(id = %reply.id, "Reply for unknown command");
            }

            return;
        }

        // Try to parse as TabEvent
        if let Ok(event) = from_str::<TabEvent>(text)
            && event.event_type == "event"
        {
            trace!(method = %event.method, "Tab event received");
            let _ = events_tx.send(event);
            return;
        }

        // Try to parse as CrawlRequest
        if let Ok(request) = from_str::<CrawlRequest>(text) {
            trace!(id = %request.id, method = %request.method, "Crawl request received");
            let _ = requests_tx.send(request);
            return;
        }

        warn!(text = %text, "Failed to parse incoming frame");
    }

    /// Handles a send command from the Rust API.
    async fn handle_send_command(
        request: CommandRequest,
        reply_tx: oneshot::Sender<Result<CommandReply>>,
        ws_write: &mut futures_util::stream::SplitSink<WebSocketStream<TcpStream>, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = request.id;

        // Serialize request
        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = reply_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Store correlation before sending
        correlation.lock().insert(request_id, reply_tx);

        // Send over WebSocket
        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            // Remove correlation and notify caller
            if let Some(tx) = correlation.lock().remove(&request_id) {
                let _ = tx.send(Err(Error::bridge(e.to_string())));
            }
        }

        trace!(?request_id, "Command sent");
    }

    /// Fails all pending commands with [`Error::BridgeClosed`].
    fn fail_pending_commands(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::BridgeClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending commands on shutdown");
        }
    }
}

impl std::fmt::Debug for BridgeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeChannel")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use tokio_tungstenite::MaybeTlsStream;

    type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Builds a loopback WebSocket pair: a spawned channel on the server
    /// side and a raw client stream standing in for the bridge.
    async fn loopback() -> (
        BridgeChannel,
        mpsc::UnboundedReceiver<CrawlRequest>,
        mpsc::UnboundedReceiver<TabEvent>,
        ClientStream,
    ) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            tokio_tungstenite::accept_async(stream).await.expect("upgrade")
        });

        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("connect");
        let ws_stream = server.await.expect("server task");

        let (channel, requests, events) = BridgeChannel::spawn(ws_stream);
        (channel, requests, events, client)
    }

    async fn client_send(client: &mut ClientStream, value: Value) {
        let frame = to_string(&value).expect("serialize");
        client
            .send(Message::Text(frame.into()))
            .await
            .expect("send");
    }

    async fn client_recv(client: &mut ClientStream) -> Value {
        loop {
            let message = timeout(Duration::from_secs(5), client.next())
                .await
                .expect("recv deadline")
                .expect("stream open")
                .expect("frame");
            if let Message::Text(text) = message {
                return from_str(&text).expect("parse");
            }
        }
    }

    #[tokio::test]
    async fn test_crawl_request_routed() {
        let (_channel, mut requests, _events, mut client) = loopback().await;

        client_send(
            &mut client,
            json!({
                "id": "650e8400-e29b-41d4-a716-446655440000",
                "method": "crawl.extract",
                "params": {}
            }),
        )
        .await;

        let request = timeout(Duration::from_secs(5), requests.recv())
            .await
            .expect("deadline")
            .expect("request");
        assert_eq!(request.method, "crawl.extract");
    }

    #[tokio::test]
    async fn test_tab_event_routed() {
        let (_channel, _requests, mut events, mut client) = loopback().await;

        client_send(
            &mut client,
            json!({
                "type": "event",
                "method": "tabs.statusChanged",
                "params": { "tabId": 3, "status": "complete" }
            }),
        )
        .await;

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("deadline")
            .expect("event");
        assert_eq!(event.method, "tabs.statusChanged");
    }

    #[tokio::test]
    async fn test_command_round_trip() {
        let (channel, _requests, _events, mut client) = loopback().await;

        let bridge = tokio::spawn(async move {
            let frame = client_recv(&mut client).await;
            assert_eq!(frame["method"], "tabs.create");
            assert_eq!(frame["params"]["url"], "https://example.com");

            client_send(
                &mut client,
                json!({
                    "id": frame["id"],
                    "type": "success",
                    "result": { "tabId": 7 }
                }),
            )
            .await;
            client
        });

        let reply = channel
            .command(TabCommand::Create {
                url: "https://example.com".to_string(),
            })
            .await
            .expect("reply");

        assert!(reply.is_success());
        assert_eq!(reply.get_u64("tabId"), 7);
        assert_eq!(channel.pending_count(), 0);

        drop(bridge.await.expect("bridge task"));
    }

    #[tokio::test]
    async fn test_command_timeout_cleans_correlation() {
        let (channel, _requests, _events, mut client) = loopback().await;

        let result = channel
            .command_with_timeout(
                TabCommand::Status {
                    tab_id: crate::identifiers::TabId::new(1).expect("tab id"),
                },
                Duration::from_millis(50),
            )
            .await;

        // Swallow the outgoing command frame, never reply
        let frame = client_recv(&mut client).await;
        assert_eq!(frame["method"], "tabs.status");

        let err = result.expect_err("should time out");
        assert!(err.is_timeout());

        // The cleanup command is processed by the loop shortly after
        for _ in 0..100 {
            if channel.pending_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(channel.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_peer_close_fails_pending_commands() {
        let (channel, mut requests, _events, mut client) = loopback().await;

        let pending = {
            let channel = channel.clone();
            tokio::spawn(async move {
                channel
                    .command(TabCommand::Status {
                        tab_id: crate::identifiers::TabId::new(1).expect("tab id"),
                    })
                    .await
            })
        };

        // Read the command frame, then hang up without answering
        let _ = client_recv(&mut client).await;
        client.close(None).await.expect("close");

        let result = pending.await.expect("task");
        assert!(matches!(result, Err(Error::BridgeClosed)));

        // The request stream closes with the connection
        let next = timeout(Duration::from_secs(5), requests.recv())
            .await
            .expect("deadline");
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_send_reply_reaches_peer() {
        let (channel, _requests, _events, mut client) = loopback().await;

        let id = RequestId::generate();
        channel
            .send_reply(&CrawlReply::empty(id))
            .expect("queue reply");

        let frame = client_recv(&mut client).await;
        assert_eq!(frame["id"], id.to_string());
        assert_eq!(frame["type"], "success");
        assert_eq!(frame["result"], json!({}));
    }

    #[tokio::test]
    async fn test_unparseable_frame_is_ignored() {
        let (channel, mut requests, _events, mut client) = loopback().await;

        client_send(&mut client, json!({ "whatever": true })).await;

        // The channel stays usable afterwards
        client_send(
            &mut client,
            json!({
                "id": "650e8400-e29b-41d4-a716-446655440001",
                "method": "system.ping",
                "params": {}
            }),
        )
        .await;

        let request = timeout(Duration::from_secs(5), requests.recv())
            .await
            .expect("deadline")
            .expect("request");
        assert_eq!(request.method, "system.ping");
        assert_eq!(channel.pending_count(), 0);
    }
}
