//! Builder pattern for crawl host configuration.
//!
//! Provides a fluent API for configuring and creating [`CrawlHost`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tab_crawler::CrawlHost;
//!
//! # fn example() -> tab_crawler::Result<()> {
//! let host = CrawlHost::builder()
//!     .store_path("./crawl-session.json")
//!     .load_timeout(Duration::from_secs(45))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

use super::core::CrawlHost;
use super::options::CrawlConfig;

// ============================================================================
// CrawlHostBuilder
// ============================================================================

/// Builder for configuring a [`CrawlHost`] instance.
///
/// Use [`CrawlHost::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct CrawlHostBuilder {
    /// Path to the session store file.
    store_path: Option<PathBuf>,
    /// Timing configuration.
    config: CrawlConfig,
}

// ============================================================================
// CrawlHostBuilder Implementation
// ============================================================================

impl CrawlHostBuilder {
    /// Creates a new host builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path of the session store file.
    ///
    /// The file holds the active tab handle so a crawl session survives
    /// host restarts. Its parent directory must exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the store file (e.g., "./crawl-session.json")
    #[inline]
    #[must_use]
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Replaces the whole timing configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: CrawlConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the page-load timeout.
    #[inline]
    #[must_use]
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.config.load_timeout = timeout;
        self
    }

    /// Sets the settle delay applied after a load completes.
    #[inline]
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Sets the direct-fetch deadline.
    #[inline]
    #[must_use]
    pub fn direct_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.direct_fetch_timeout = timeout;
        self
    }

    /// Sets the tab command deadline.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Builds the host with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the store path is not set or its parent
    ///   directory does not exist
    /// - [`Error::Config`] if the timing configuration is invalid
    pub fn build(self) -> Result<CrawlHost> {
        let store_path = self.validate_store_path()?;
        self.config.validate().map_err(Error::config)?;

        CrawlHost::new(store_path, self.config)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl CrawlHostBuilder {
    /// Validates the store path configuration.
    fn validate_store_path(&self) -> Result<PathBuf> {
        let store_path = self.store_path.clone().ok_or_else(|| {
            Error::config(
                "Session store path is required. Use .store_path() to set it.\n\
                 Example: CrawlHost::builder().store_path(\"./crawl-session.json\")",
            )
        })?;

        // The file itself may not exist yet; its directory must
        if let Some(parent) = store_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            return Err(Error::config(format!(
                "Session store directory not found: {}\n\
                 Create the directory before starting the host.",
                parent.display()
            )));
        }

        Ok(store_path)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = CrawlHostBuilder::new();
        assert!(builder.store_path.is_none());
        assert_eq!(builder.config, CrawlConfig::default());
    }

    #[test]
    fn test_store_path_sets_path() {
        let builder = CrawlHostBuilder::new().store_path("./session.json");
        assert_eq!(builder.store_path, Some(PathBuf::from("./session.json")));
    }

    #[test]
    fn test_timeout_setters_touch_config() {
        let builder = CrawlHostBuilder::new()
            .load_timeout(Duration::from_secs(45))
            .settle_delay(Duration::from_secs(1))
            .direct_fetch_timeout(Duration::from_secs(10))
            .command_timeout(Duration::from_secs(15));

        assert_eq!(builder.config.load_timeout, Duration::from_secs(45));
        assert_eq!(builder.config.settle_delay, Duration::from_secs(1));
        assert_eq!(builder.config.direct_fetch_timeout, Duration::from_secs(10));
        assert_eq!(builder.config.command_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_config_replaces_whole_configuration() {
        let config = CrawlConfig::new().with_settle_delay(Duration::ZERO);
        let builder = CrawlHostBuilder::new().config(config.clone());
        assert_eq!(builder.config, config);
    }

    #[test]
    fn test_build_fails_without_store_path() {
        let result = CrawlHostBuilder::new().build();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("store path"));
    }

    #[test]
    fn test_build_fails_with_missing_parent_dir() {
        let result = CrawlHostBuilder::new()
            .store_path("/nonexistent/dir/session.json")
            .build();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("directory not found"));
    }

    #[test]
    fn test_build_succeeds_in_existing_dir() {
        let dir = TempDir::new().expect("temp dir");
        let result = CrawlHostBuilder::new()
            .store_path(dir.path().join("session.json"))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_accepts_bare_filename() {
        let result = CrawlHostBuilder::new().store_path("session.json").build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_rejects_zero_load_timeout() {
        let dir = TempDir::new().expect("temp dir");
        let result = CrawlHostBuilder::new()
            .store_path(dir.path().join("session.json"))
            .load_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Load timeout"));
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = CrawlHostBuilder::new().store_path("./session.json");
        let cloned = builder.clone();
        assert_eq!(builder.store_path, cloned.store_path);
    }
}
