//! Serve the crawl host on a local WebSocket endpoint.
//!
//! Demonstrates:
//! - Building a CrawlHost with a persistent session store
//! - Serving the bridge endpoint until interrupted
//!
//! Usage:
//!   cargo run --example crawl_host
//!   cargo run --example crawl_host -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};

use common::Args;
use tab_crawler::{CrawlHost, Result};

// ============================================================================
// Constants
// ============================================================================

const STORE_PATH: &str = "./crawl-session.json";
const LISTEN_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const PORT: u16 = 9222;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== Crawl Host ===\n");

    // ========================================================================
    // Build Host
    // ========================================================================

    println!("[1] Building host...");

    let host = CrawlHost::builder().store_path(STORE_PATH).build()?;

    println!("    ✓ Host ready");
    println!("    Store:        {}", host.store_path().display());
    println!("    Load timeout: {:?}", host.config().load_timeout);
    println!("    Settle delay: {:?}\n", host.config().settle_delay);

    // ========================================================================
    // Serve
    // ========================================================================

    println!("[2] Serving bridge endpoint...");
    println!("    URL: ws://{LISTEN_IP}:{PORT}");
    println!("    Point the privileged bridge page at this endpoint.");
    println!("    Press Ctrl+C to stop.\n");

    tokio::select! {
        result = host.serve(LISTEN_IP, PORT) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\n[Cleanup] Host stopped");
            Ok(())
        }
    }
}
