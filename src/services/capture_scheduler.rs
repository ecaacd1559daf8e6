//! Capture Scheduler.
//!
//! Decides when and how many preview resolutions run. Requests enter a FIFO
//! channel; a single dispatcher takes them in arrival order and starts each one
//! as soon as a semaphore permit is free, so at most `limit` resolutions are in
//! flight. A permit is released the moment its capture finishes, success or not.
//!
//! Results are delivered on an outcome channel. The receiver decides whether a
//! result still matters (the tile may have left the visible set meanwhile).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::platform::host::ScriptHost;
use crate::services::image_fetcher::ImageFetcher;
use crate::services::preview_resolver::PreviewResolver;
use crate::services::thumbnail_cache::{CacheKey, ThumbnailCache};
use crate::types::preview::{ImageRef, PreviewResult, UnavailableReason};
use crate::types::tab::{is_capturable_url, TabRecord};

/// A finished (or cache-served) capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub key: CacheKey,
    pub result: PreviewResult,
    pub from_cache: bool,
}

/// What happened to a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Served from the cache without touching the resolver.
    CacheHit,
    Queued,
    /// The same key is already queued or running.
    AlreadyPending,
    /// Non-web URL, answered immediately as unavailable.
    Rejected,
    /// The scheduler was shut down.
    Closed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub started: usize,
    pub completed: usize,
    pub in_flight: usize,
    pub peak_in_flight: usize,
}

struct Shared {
    resolver: PreviewResolver,
    host: Arc<dyn ScriptHost>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
    cache: Arc<ThumbnailCache>,
    semaphore: Arc<Semaphore>,
    closed: AtomicBool,
    pending: Mutex<HashSet<CacheKey>>,
    stats: Mutex<CaptureStats>,
    outcomes: mpsc::UnboundedSender<CaptureOutcome>,
}

impl Shared {
    fn emit(&self, key: CacheKey, result: PreviewResult, from_cache: bool) {
        // The receiver is gone once the overview closed; results are discarded.
        let _ = self.outcomes.send(CaptureOutcome {
            key,
            result,
            from_cache,
        });
    }

    fn finish_pending(&self, key: &CacheKey) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    fn update_stats(&self, f: impl FnOnce(&mut CaptureStats)) {
        f(&mut self.stats.lock().unwrap_or_else(|e| e.into_inner()));
    }

    async fn run(&self, tab: TabRecord) {
        let key = CacheKey::for_tab(&tab);

        if let Some(image) = self.cache.get(&key) {
            self.finish_pending(&key);
            self.emit(key, PreviewResult::Image(image), true);
            return;
        }

        self.update_stats(|s| {
            s.started += 1;
            s.in_flight += 1;
            s.peak_in_flight = s.peak_in_flight.max(s.in_flight);
        });

        let mut result = self.resolver.resolve_tab(self.host.as_ref(), &tab).await;

        if let (PreviewResult::Image(preview), Some(fetcher)) = (&mut result, &self.fetcher) {
            if let ImageRef::Remote(url) = &preview.image {
                match fetcher.fetch(url).await {
                    Ok(fetched) => preview.image = ImageRef::Inline(fetched.to_data_url()),
                    Err(e) => debug!(tab_id = tab.id, error = %e, "inlining failed, keeping remote url"),
                }
            }
        }

        if let PreviewResult::Image(preview) = &result {
            self.cache.insert(key.clone(), preview.clone());
        }

        self.update_stats(|s| {
            s.completed += 1;
            s.in_flight -= 1;
        });
        self.finish_pending(&key);
        trace!(tab_id = tab.id, "capture finished");
        self.emit(key, result, false);
    }
}

/// Bounded-concurrency capture queue. Must be created inside a Tokio runtime.
pub struct CaptureScheduler {
    shared: Arc<Shared>,
    jobs: Option<mpsc::UnboundedSender<TabRecord>>,
    dispatcher: Option<JoinHandle<()>>,
    limit: usize,
}

impl CaptureScheduler {
    pub fn new(
        resolver: PreviewResolver,
        host: Arc<dyn ScriptHost>,
        cache: Arc<ThumbnailCache>,
        fetcher: Option<Arc<dyn ImageFetcher>>,
        limit: usize,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureOutcome>) {
        let limit = limit.max(1);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<TabRecord>();

        let shared = Arc::new(Shared {
            resolver,
            host,
            fetcher,
            cache,
            semaphore: Arc::new(Semaphore::new(limit)),
            closed: AtomicBool::new(false),
            pending: Mutex::new(HashSet::new()),
            stats: Mutex::new(CaptureStats::default()),
            outcomes: outcome_tx,
        });

        let dispatch_shared = shared.clone();
        let dispatcher = tokio::spawn(async move {
            while let Some(tab) = job_rx.recv().await {
                let Ok(permit) = dispatch_shared.semaphore.clone().acquire_owned().await else {
                    break;
                };
                if dispatch_shared.closed.load(Ordering::Acquire) {
                    dispatch_shared.finish_pending(&CacheKey::for_tab(&tab));
                    continue;
                }
                let worker = dispatch_shared.clone();
                tokio::spawn(async move {
                    worker.run(tab).await;
                    drop(permit);
                });
            }
            debug!("capture dispatcher stopped");
        });

        (
            Self {
                shared,
                jobs: Some(job_tx),
                dispatcher: Some(dispatcher),
                limit,
            },
            outcome_rx,
        )
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn stats(&self) -> CaptureStats {
        *self.shared.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn cache(&self) -> &Arc<ThumbnailCache> {
        &self.shared.cache
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Asks for a preview of `tab`. Cache hits and rejected schemes are
    /// answered on the outcome channel right away.
    pub fn request(&self, tab: &TabRecord) -> RequestStatus {
        let Some(jobs) = self.jobs.as_ref().filter(|_| !self.is_closed()) else {
            return RequestStatus::Closed;
        };
        let key = CacheKey::for_tab(tab);

        if !is_capturable_url(&tab.url) {
            self.shared.emit(
                key,
                PreviewResult::Unavailable(UnavailableReason::UnsupportedScheme),
                false,
            );
            return RequestStatus::Rejected;
        }

        if let Some(image) = self.shared.cache.get(&key) {
            self.shared.emit(key, PreviewResult::Image(image), true);
            return RequestStatus::CacheHit;
        }

        {
            let mut pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
            if !pending.insert(key.clone()) {
                return RequestStatus::AlreadyPending;
            }
        }

        if jobs.send(tab.clone()).is_err() {
            self.shared.finish_pending(&key);
            return RequestStatus::Closed;
        }
        RequestStatus::Queued
    }

    /// Stops dispatching queued work. Captures already running complete; their
    /// results are still cached.
    pub fn shutdown(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.jobs = None;
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.abort();
        }
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
