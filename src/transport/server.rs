//! WebSocket server for bridge communication.
//!
//! This module provides the WebSocket server that the browser-side
//! bridge connects to.
//!
//! # Connection Flow
//!
//! 1. Host binds the WebSocket server to a configured address
//! 2. The privileged page loads in the browser and its bridge connects
//! 3. Host announces readiness with the supported request kinds
//! 4. Session established, crawl requests and tab commands flow

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::{CrawlRequest, ReadyEvent, TabEvent};

use super::BridgeChannel;

// ============================================================================
// BridgeSession
// ============================================================================

/// An accepted bridge connection.
///
/// Bundles the channel handle with the inbound streams it feeds. The
/// streams close when the connection ends.
pub struct BridgeSession {
    /// Channel for tab commands and outbound frames.
    pub channel: BridgeChannel,
    /// Inbound crawl requests.
    pub requests: mpsc::UnboundedReceiver<CrawlRequest>,
    /// Inbound tab events.
    pub events: mpsc::UnboundedReceiver<TabEvent>,
    /// Peer address of the bridge.
    pub peer: SocketAddr,
}

impl std::fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSession")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BridgeServer
// ============================================================================

/// WebSocket server the browser-side bridge connects to.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use tab_crawler::BridgeServer;
///
/// let server = BridgeServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 9222).await?;
/// println!("bridge should connect to {}", server.ws_url());
///
/// let session = server.accept().await?;
/// ```
pub struct BridgeServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address the server is bound to.
    local_addr: SocketAddr,
}

impl BridgeServer {
    /// Binds a WebSocket server to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Arguments
    ///
    /// * `ip` - IP address to bind to (typically localhost)
    /// * `port` - Port to bind to (0 for random)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        debug!(addr = %local_addr, "WebSocket server bound");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://{ip}:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Accepts one bridge connection and announces readiness.
    ///
    /// Waits as long as it takes for a bridge to connect; the privileged
    /// page may load well after the host starts. The ready announcement
    /// is queued before this method returns, so it is always the first
    /// frame the bridge sees.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if accepting the TCP connection fails
    /// - [`Error::Bridge`] if the WebSocket upgrade fails
    pub async fn accept(&self) -> Result<BridgeSession> {
        let (stream, peer) = self.listener.accept().await?;

        debug!(%peer, "TCP connection accepted");

        // Upgrade to WebSocket
        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::bridge(format!("WebSocket upgrade failed: {e}")))?;

        let (channel, requests, events) = BridgeChannel::spawn(ws_stream);
        channel.send_ready(&ReadyEvent::announce())?;

        info!(%peer, "Bridge connected");

        Ok(BridgeSession {
            channel,
            requests,
            events,
            peer,
        })
    }
}

impl std::fmt::Debug for BridgeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeServer")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;
    use std::time::Duration;

    use futures_util::StreamExt;
    use serde_json::Value;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = BridgeServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        assert!(server.port() > 0);
        assert!(server.ws_url().starts_with("ws://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_server_ws_url_format() {
        let server = BridgeServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        let url = server.ws_url();
        let expected = format!("ws://127.0.0.1:{}", server.port());
        assert_eq!(url, expected);
    }

    #[tokio::test]
    async fn test_server_local_addr() {
        let server = BridgeServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        let addr = server.local_addr();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(addr.port(), server.port());
    }

    #[tokio::test]
    async fn test_accept_announces_ready_first() {
        let server = BridgeServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");
        let url = server.ws_url();

        let accept = tokio::spawn(async move { server.accept().await });

        let (mut client, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("connect");

        let session = accept.await.expect("task").expect("accept");
        assert!(session.peer.ip().is_loopback());

        // First frame is the ready announcement
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("deadline")
            .expect("stream open")
            .expect("frame");
        let Message::Text(text) = frame else {
            panic!("expected text frame");
        };

        let value: Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(value["type"], "event");
        assert_eq!(value["method"], "system.ready");
        let methods = value["params"]["methods"].as_array().expect("methods");
        assert!(methods.iter().any(|m| m == "crawl.fetch"));
        assert!(methods.iter().any(|m| m == "system.ping"));
    }
}
