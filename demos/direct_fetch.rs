//! Fetch a URL directly over HTTP, bypassing the browser tab.
//!
//! Demonstrates:
//! - Building a DirectFetcher with a bounded timeout
//! - In-band failure reporting (HTTP status, content type, deadline)
//!
//! Usage:
//!   cargo run --example direct_fetch -- https://example.com
//!   cargo run --example direct_fetch -- --debug https://example.com

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use tab_crawler::{DirectFetcher, FetchOutcome, Result};

// ============================================================================
// Constants
// ============================================================================

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_URL: &str = "https://example.com";
const PREVIEW_CHARS: usize = 200;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    let url = common::positional_arg(DEFAULT_URL);

    if let Err(e) = run(&url).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(url: &str) -> Result<()> {
    println!("=== Direct Fetch ===\n");

    // ========================================================================
    // Build Fetcher
    // ========================================================================

    println!("[1] Building fetcher...");

    let fetcher = DirectFetcher::new(FETCH_TIMEOUT)?;

    println!("    ✓ Fetcher ready (timeout {FETCH_TIMEOUT:?})\n");

    // ========================================================================
    // Fetch
    // ========================================================================

    println!("[2] Fetching {url}...");

    match fetcher.fetch_direct(url).await {
        FetchOutcome::Html { html } => {
            println!("    ✓ Received {} bytes of HTML\n", html.len());

            let preview: String = html.chars().take(PREVIEW_CHARS).collect();
            println!("{preview}");
            if html.chars().count() > PREVIEW_CHARS {
                println!("...");
            }
        }
        FetchOutcome::Failed { error, status } => {
            println!("    ✗ Fetch failed");
            println!("    Error:  {error}");
            println!("    Status: {status}");
        }
    }

    Ok(())
}
