//! Crawl host module.
//!
//! This module provides the main entry point for running a crawl host.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CrawlHost`] | The serve loop over bridge connections |
//! | [`CrawlHostBuilder`] | Fluent configuration builder |
//! | [`CrawlConfig`] | Timing configuration |
//!
//! # Example
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use tab_crawler::{CrawlHost, Result};
//!
//! # async fn example() -> Result<()> {
//! let host = CrawlHost::builder()
//!     .store_path("./crawl-session.json")
//!     .build()?;
//!
//! host.serve(IpAddr::V4(Ipv4Addr::LOCALHOST), 9222).await
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for host configuration.
pub mod builder;

/// Core host implementation.
pub mod core;

/// Crawl timing configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CrawlHostBuilder;
pub use core::CrawlHost;
pub use options::CrawlConfig;
