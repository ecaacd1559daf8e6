//! Unit tests for the capture scheduler: concurrency bound, FIFO dispatch,
//! TTL cache behaviour, deduplication, shutdown and image inlining.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use tabmosaic::platform::memory::InMemoryHost;
use tabmosaic::services::capture_scheduler::{CaptureOutcome, CaptureScheduler, RequestStatus};
use tabmosaic::services::image_fetcher::{FetchedImage, ImageFetcher};
use tabmosaic::services::preview_resolver::PreviewResolver;
use tabmosaic::services::thumbnail_cache::{CacheKey, ThumbnailCache};
use tabmosaic::types::errors::FetchError;
use tabmosaic::types::preview::{
    DocumentSnapshot, ImageRef, MetaTag, PreviewResult, PreviewSource, UnavailableReason,
};
use tabmosaic::types::tab::TabRecord;

const TTL: Duration = Duration::from_secs(300);

fn tab(id: i64) -> TabRecord {
    TabRecord {
        id,
        window_id: 1,
        title: format!("Tab {}", id),
        url: format!("https://site{}.test/", id),
        favicon_url: None,
        discarded: false,
        last_accessed_at: 0,
    }
}

fn host_with_docs(count: i64, delay: Duration) -> Arc<InMemoryHost> {
    let host = Arc::new(InMemoryHost::new().with_script_delay(delay));
    for id in 1..=count {
        host.set_document(
            id,
            DocumentSnapshot {
                url: format!("https://site{}.test/", id),
                title: format!("Tab {}", id),
                meta: vec![MetaTag {
                    property: Some("og:image".to_string()),
                    name: None,
                    content: Some("/og.png".to_string()),
                }],
                ..Default::default()
            },
        );
    }
    host
}

fn new_scheduler(
    host: &Arc<InMemoryHost>,
    limit: usize,
    fetcher: Option<Arc<dyn ImageFetcher>>,
) -> (CaptureScheduler, UnboundedReceiver<CaptureOutcome>) {
    CaptureScheduler::new(
        PreviewResolver::new(),
        host.clone(),
        Arc::new(ThumbnailCache::new(TTL)),
        fetcher,
        limit,
    )
}

async fn collect(rx: &mut UnboundedReceiver<CaptureOutcome>, n: usize) -> Vec<CaptureOutcome> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(rx.recv().await.expect("outcome channel closed"));
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_never_exceeds_concurrency_bound() {
    let host = host_with_docs(20, Duration::from_millis(100));
    let (scheduler, mut rx) = new_scheduler(&host, 3, None);

    for id in 1..=20 {
        assert_eq!(scheduler.request(&tab(id)), RequestStatus::Queued);
    }
    let outcomes = collect(&mut rx, 20).await;

    assert_eq!(outcomes.len(), 20);
    assert_eq!(host.snapshot_calls(), 20);
    assert!(host.peak_concurrent_snapshots() <= 3);
    assert_eq!(host.peak_concurrent_snapshots(), 3);
    let stats = scheduler.stats();
    assert_eq!(stats.completed, 20);
    assert_eq!(stats.in_flight, 0);
    assert!(stats.peak_in_flight <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_limit_is_at_least_one() {
    let host = host_with_docs(1, Duration::ZERO);
    let (scheduler, _rx) = new_scheduler(&host, 0, None);
    assert_eq!(scheduler.limit(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_is_fifo() {
    let host = host_with_docs(6, Duration::from_millis(10));
    let (scheduler, mut rx) = new_scheduler(&host, 1, None);

    for id in [4, 2, 6, 1, 5, 3] {
        scheduler.request(&tab(id));
    }
    let order: Vec<i64> = collect(&mut rx, 6).await.iter().map(|o| o.key.tab_id).collect();
    assert_eq!(order, vec![4, 2, 6, 1, 5, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_within_ttl_skips_resolver() {
    let host = host_with_docs(1, Duration::from_millis(10));
    let (scheduler, mut rx) = new_scheduler(&host, 2, None);

    assert_eq!(scheduler.request(&tab(1)), RequestStatus::Queued);
    let first = collect(&mut rx, 1).await.remove(0);
    assert!(!first.from_cache);
    assert_eq!(host.snapshot_calls(), 1);

    tokio::time::advance(Duration::from_secs(299)).await;
    assert_eq!(scheduler.request(&tab(1)), RequestStatus::CacheHit);
    let second = collect(&mut rx, 1).await.remove(0);
    assert!(second.from_cache);
    assert_eq!(second.result, first.result);
    assert_eq!(host.snapshot_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_triggers_new_capture() {
    let host = host_with_docs(1, Duration::from_millis(10));
    let (scheduler, mut rx) = new_scheduler(&host, 2, None);

    scheduler.request(&tab(1));
    collect(&mut rx, 1).await;

    tokio::time::advance(TTL + Duration::from_secs(1)).await;
    assert_eq!(scheduler.request(&tab(1)), RequestStatus::Queued);
    collect(&mut rx, 1).await;
    assert_eq!(host.snapshot_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_url_change_is_a_new_key() {
    let host = host_with_docs(1, Duration::from_millis(10));
    let (scheduler, mut rx) = new_scheduler(&host, 2, None);

    scheduler.request(&tab(1));
    collect(&mut rx, 1).await;

    let mut navigated = tab(1);
    navigated.url = "https://site1.test/other".to_string();
    assert_eq!(scheduler.request(&navigated), RequestStatus::Queued);
    let outcome = collect(&mut rx, 1).await.remove(0);
    assert_eq!(outcome.key, CacheKey::for_tab(&navigated));
    assert_eq!(host.snapshot_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_request_while_pending() {
    let host = host_with_docs(1, Duration::from_millis(100));
    let (scheduler, mut rx) = new_scheduler(&host, 2, None);

    assert_eq!(scheduler.request(&tab(1)), RequestStatus::Queued);
    assert_eq!(scheduler.request(&tab(1)), RequestStatus::AlreadyPending);
    collect(&mut rx, 1).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(rx.try_recv().is_err());
    assert_eq!(host.snapshot_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_scheme_rejected_immediately() {
    let host = host_with_docs(0, Duration::ZERO);
    let (scheduler, mut rx) = new_scheduler(&host, 2, None);

    let mut settings = tab(5);
    settings.url = "chrome://settings".to_string();
    assert_eq!(scheduler.request(&settings), RequestStatus::Rejected);

    let outcome = rx.try_recv().expect("rejection is delivered synchronously");
    assert_eq!(
        outcome.result,
        PreviewResult::Unavailable(UnavailableReason::UnsupportedScheme)
    );
    assert_eq!(host.snapshot_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_not_cached() {
    let host = host_with_docs(0, Duration::from_millis(10));
    let (scheduler, mut rx) = new_scheduler(&host, 2, None);

    scheduler.request(&tab(1));
    let outcome = collect(&mut rx, 1).await.remove(0);
    assert_eq!(
        outcome.result,
        PreviewResult::Unavailable(UnavailableReason::ExecutionFailed)
    );
    assert!(scheduler.cache().is_empty());

    assert_eq!(scheduler.request(&tab(1)), RequestStatus::Queued);
    collect(&mut rx, 1).await;
    assert_eq!(host.snapshot_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_queued_work() {
    let host = host_with_docs(5, Duration::from_millis(100));
    let (mut scheduler, mut rx) = new_scheduler(&host, 1, None);

    for id in 1..=5 {
        scheduler.request(&tab(id));
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    scheduler.shutdown();
    assert!(scheduler.is_closed());
    assert_eq!(scheduler.request(&tab(1)), RequestStatus::Closed);

    // The capture already running completes; nothing else starts.
    let finished = collect(&mut rx, 1).await.remove(0);
    assert_eq!(finished.key.tab_id, 1);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(host.snapshot_calls(), 1);
    assert!(rx.try_recv().is_err());
}

// === Inlining ===

struct FixedFetcher;

#[async_trait]
impl ImageFetcher for FixedFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, FetchError> {
        Ok(FetchedImage {
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        })
    }
}

struct FailingFetcher;

#[async_trait]
impl ImageFetcher for FailingFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, FetchError> {
        Err(FetchError::Status(404))
    }
}

#[tokio::test(start_paused = true)]
async fn test_remote_preview_is_inlined() {
    let host = host_with_docs(1, Duration::ZERO);
    let (scheduler, mut rx) = new_scheduler(&host, 2, Some(Arc::new(FixedFetcher)));

    scheduler.request(&tab(1));
    let outcome = collect(&mut rx, 1).await.remove(0);
    match outcome.result {
        PreviewResult::Image(preview) => {
            assert_eq!(preview.source, PreviewSource::MetaTag);
            assert_eq!(preview.image, ImageRef::Inline("data:image/png;base64,AQID".to_string()));
        }
        other => panic!("expected image, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_inlining_keeps_remote_url() {
    let host = host_with_docs(1, Duration::ZERO);
    let (scheduler, mut rx) = new_scheduler(&host, 2, Some(Arc::new(FailingFetcher)));

    scheduler.request(&tab(1));
    let outcome = collect(&mut rx, 1).await.remove(0);
    match outcome.result {
        PreviewResult::Image(preview) => {
            assert_eq!(preview.image, ImageRef::Remote("https://site1.test/og.png".to_string()));
        }
        other => panic!("expected image, got {:?}", other),
    }
}
