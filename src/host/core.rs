//! Crawl host lifecycle and serve loop.
//!
//! [`CrawlHost`] ties the pieces together: it binds the WebSocket
//! server, and for each bridge connection wires a [`Crawler`] over
//! [`BridgeTabs`] to a [`Dispatcher`] that answers the bridge's crawl
//! requests.
//!
//! Connections are served one at a time. A crawl session drives a
//! single tab through a single bridge; when the bridge drops (the
//! privileged page reloaded, the browser restarted), the host simply
//! waits for the next connection and picks the session back up from the
//! store.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::crawler::Crawler;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::fetch::DirectFetcher;
use crate::store::SessionStore;
use crate::tabs::TabHost;
use crate::transport::{BridgeServer, BridgeSession, BridgeTabs};

use super::builder::CrawlHostBuilder;
use super::options::CrawlConfig;

// ============================================================================
// CrawlHost
// ============================================================================

/// The crawl host.
///
/// Cheap to clone; clones share the same configuration and direct
/// fetcher.
///
/// # Example
///
/// ```no_run
/// use std::net::{IpAddr, Ipv4Addr};
/// use tab_crawler::CrawlHost;
///
/// # async fn example() -> tab_crawler::Result<()> {
/// let host = CrawlHost::builder()
///     .store_path("./crawl-session.json")
///     .build()?;
///
/// host.serve(IpAddr::V4(Ipv4Addr::LOCALHOST), 9222).await
/// # }
/// ```
#[derive(Clone)]
pub struct CrawlHost {
    inner: Arc<CrawlHostInner>,
}

/// Shared host state.
struct CrawlHostInner {
    /// Path of the session store file.
    store_path: PathBuf,
    /// Timing configuration.
    config: CrawlConfig,
    /// Direct HTTP fetcher, shared across connections.
    fetcher: DirectFetcher,
}

impl CrawlHost {
    /// Creates a builder for configuring a host.
    #[inline]
    #[must_use]
    pub fn builder() -> CrawlHostBuilder {
        CrawlHostBuilder::new()
    }

    /// Creates a host from validated configuration.
    pub(crate) fn new(store_path: PathBuf, config: CrawlConfig) -> Result<Self> {
        let fetcher = DirectFetcher::new(config.direct_fetch_timeout)?;

        Ok(Self {
            inner: Arc::new(CrawlHostInner {
                store_path,
                config,
                fetcher,
            }),
        })
    }

    /// Returns the timing configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CrawlConfig {
        &self.inner.config
    }

    /// Returns the session store path.
    #[inline]
    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.inner.store_path
    }

    /// Binds the WebSocket server and serves bridge connections forever.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails or the
    /// listener breaks.
    pub async fn serve(&self, ip: IpAddr, port: u16) -> Result<()> {
        let server = BridgeServer::bind(ip, port).await?;
        info!(addr = %server.local_addr(), "Crawl host listening");

        self.serve_on(server).await
    }

    /// Serves bridge connections on an already-bound server.
    ///
    /// Connections are handled one at a time; a new bridge is accepted
    /// only after the previous one disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the listener breaks.
    /// Failed WebSocket upgrades are logged and do not stop the loop.
    pub async fn serve_on(&self, server: BridgeServer) -> Result<()> {
        loop {
            match server.accept().await {
                Ok(session) => self.run_connection(session).await,
                Err(err) if err.is_bridge_error() => {
                    warn!(error = %err, "Rejected bridge connection");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Drives one bridge connection to completion.
    async fn run_connection(&self, session: BridgeSession) {
        let BridgeSession {
            channel,
            mut requests,
            mut events,
            peer,
        } = session;

        let tabs: Arc<dyn TabHost> = Arc::new(BridgeTabs::new(
            channel.clone(),
            self.inner.config.command_timeout,
        ));
        let store = SessionStore::new(&self.inner.store_path);
        let crawler = Arc::new(Crawler::new(tabs, store, self.inner.config.clone()));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&crawler),
            self.inner.fetcher.clone(),
        ));

        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(request) = request else { break };

                    // Requests run concurrently so a slow crawl cannot
                    // starve pings or event handling
                    let dispatcher = Arc::clone(&dispatcher);
                    let channel = channel.clone();
                    tokio::spawn(async move {
                        if let Some(reply) = dispatcher.dispatch(request).await
                            && let Err(e) = channel.send_reply(&reply)
                        {
                            warn!(error = %e, "Failed to send crawl reply");
                        }
                    });
                }

                event = events.recv() => {
                    let Some(event) = event else { break };
                    crawler.handle_event(&event.parse()).await;
                }
            }
        }

        crawler.fail_pending_waits();
        info!(%peer, "Bridge disconnected");
    }
}

impl fmt::Debug for CrawlHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlHost")
            .field("store_path", &self.inner.store_path)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
