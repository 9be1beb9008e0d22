//! Crawl timing configuration.
//!
//! Provides a type-safe interface for the timing knobs of a crawl host:
//! page-load timeout, post-load settle delay, and the deadlines applied
//! to direct fetches and tab commands.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tab_crawler::CrawlConfig;
//!
//! let config = CrawlConfig::new()
//!     .with_load_timeout(Duration::from_secs(45))
//!     .with_settle_delay(Duration::from_secs(1));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default page-load timeout.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Default settle delay after a page reports complete.
///
/// Pages that build their content client-side keep mutating the DOM
/// after the load event; the delay gives them room to finish.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Default deadline for a direct HTTP fetch.
pub const DEFAULT_DIRECT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Default deadline for a single tab command over the bridge.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// CrawlConfig
// ============================================================================

/// Timing configuration for a crawl host.
///
/// Controls how long the orchestrator waits at each stage of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Maximum time to wait for a page load to complete.
    pub load_timeout: Duration,

    /// Fixed delay between load completion and content extraction.
    pub settle_delay: Duration,

    /// Deadline for a direct HTTP fetch, covering the whole transfer.
    pub direct_fetch_timeout: Duration,

    /// Deadline for a single tab command reply from the bridge.
    pub command_timeout: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl CrawlConfig {
    /// Creates a configuration with default timings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            direct_fetch_timeout: DEFAULT_DIRECT_FETCH_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl CrawlConfig {
    /// Sets the page-load timeout.
    #[inline]
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Sets the settle delay applied after a load completes.
    ///
    /// A zero delay skips settling entirely.
    #[inline]
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the direct-fetch deadline.
    #[inline]
    #[must_use]
    pub const fn with_direct_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.direct_fetch_timeout = timeout;
        self
    }

    /// Sets the tab command deadline.
    #[inline]
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl CrawlConfig {
    /// Validates the configuration.
    ///
    /// The settle delay may be zero; the timeouts may not, since a zero
    /// timeout would fail every operation before it starts.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.load_timeout.is_zero() {
            return Err("Load timeout must be greater than zero".to_string());
        }
        if self.direct_fetch_timeout.is_zero() {
            return Err("Direct fetch timeout must be greater than zero".to_string());
        }
        if self.command_timeout.is_zero() {
            return Err("Command timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
