//! Crawl operation benchmark suite.
//!
//! Benchmarks the host-internal hot paths over an in-memory tab host:
//! frame parsing, request dispatch, and the open/extract operations.
//!
//! Run with: cargo bench --bench crawl_ops
//! Results saved to: target/criterion/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use tempfile::TempDir;
use tokio::runtime::Runtime;

use tab_crawler::protocol::{CommandReply, CrawlRequest, TabEvent};
use tab_crawler::{
    CrawlConfig, Crawler, DirectFetcher, Dispatcher, LoadWaiter, Result, SessionStore, TabHost,
    TabId, TabStatus,
};

// ============================================================================
// In-Memory Tab Host
// ============================================================================

/// Tab host that answers every command instantly.
///
/// Created tabs report complete immediately, so open never waits on a
/// load event and the benchmarks measure orchestration cost alone.
struct InstantHost;

#[async_trait]
impl TabHost for InstantHost {
    async fn open_tab(&self, _url: &str) -> Result<TabId> {
        Ok(TabId::new(1).expect("nonzero"))
    }

    async fn navigate(&self, _tab_id: TabId, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn close_tab(&self, _tab_id: TabId) -> Result<()> {
        Ok(())
    }

    async fn tab_status(&self, _tab_id: TabId) -> Result<Option<TabStatus>> {
        Ok(Some(TabStatus::Complete))
    }

    async fn run_snippet(&self, _tab_id: TabId, _code: &str) -> Result<Option<String>> {
        Ok(Some("<html><body>bench page</body></html>".to_string()))
    }
}

fn crawler_in(dir: &TempDir) -> Arc<Crawler> {
    let store = SessionStore::new(dir.path().join("session.json"));
    let config = CrawlConfig::default().with_settle_delay(Duration::ZERO);
    Arc::new(Crawler::new(Arc::new(InstantHost), store, config))
}

// ============================================================================
// Benchmark: Frame Parsing
// ============================================================================

fn bench_frame_parse(c: &mut Criterion) {
    let request = r#"{"id":"650e8400-e29b-41d4-a716-446655440000","method":"crawl.fetch","params":{"url":"https://example.com"}}"#;
    let event = r#"{"type":"event","method":"tabs.statusChanged","params":{"tabId":3,"status":"complete"}}"#;
    let reply = r#"{"id":"650e8400-e29b-41d4-a716-446655440000","type":"success","result":{"tabId":3}}"#;

    let mut group = c.benchmark_group("frame_parse");

    group.bench_function("crawl_request", |b| {
        b.iter(|| serde_json::from_str::<CrawlRequest>(std::hint::black_box(request)));
    });

    group.bench_function("tab_event", |b| {
        b.iter(|| {
            serde_json::from_str::<TabEvent>(std::hint::black_box(event))
                .map(|event| event.parse())
        });
    });

    group.bench_function("command_reply", |b| {
        b.iter(|| serde_json::from_str::<CommandReply>(std::hint::black_box(reply)));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Request Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();

    let crawler = crawler_in(&dir);
    let fetcher = DirectFetcher::new(Duration::from_secs(5)).unwrap();
    let dispatcher = Arc::new(Dispatcher::new(crawler, fetcher));

    let mut group = c.benchmark_group("dispatch");

    group.bench_function("ping", |b| {
        let dispatcher = Arc::clone(&dispatcher);
        b.to_async(&rt).iter(|| {
            let dispatcher = Arc::clone(&dispatcher);
            async move {
                let request: CrawlRequest = serde_json::from_value(json!({
                    "id": "650e8400-e29b-41d4-a716-446655440000",
                    "method": "system.ping",
                    "params": {}
                }))
                .unwrap();
                dispatcher.dispatch(request).await
            }
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Crawl Operations
// ============================================================================

fn bench_crawl_ops(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let crawler = crawler_in(&dir);

    let mut group = c.benchmark_group("crawl_ops");

    // Replaces the previous tab every iteration, including the store write
    group.bench_function("open", |b| {
        let crawler = Arc::clone(&crawler);
        b.to_async(&rt).iter(|| {
            let crawler = Arc::clone(&crawler);
            async move { crawler.open("https://example.com").await.unwrap() }
        });
    });

    rt.block_on(async { crawler.open("https://example.com").await.unwrap() });

    group.bench_function("extract", |b| {
        let crawler = Arc::clone(&crawler);
        b.to_async(&rt).iter(|| {
            let crawler = Arc::clone(&crawler);
            async move { crawler.extract().await.unwrap() }
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Load Waiter
// ============================================================================

fn bench_load_waiter(c: &mut Criterion) {
    let waiter = LoadWaiter::default();
    let tab_id = TabId::new(7).expect("nonzero");

    c.bench_function("load_waiter/register_notify", |b| {
        b.iter(|| {
            let wait = waiter.begin(tab_id);
            assert!(waiter.notify_complete(tab_id));
            drop(wait);
        });
    });
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(
    benches,
    bench_frame_parse,
    bench_dispatch,
    bench_crawl_ops,
    bench_load_waiter
);
criterion_main!(benches);
