//! Schedule-or-replace write coalescing.
//!
//! At most one write is pending at a time. Scheduling a new value replaces the
//! pending one and restarts the delay; `flush` performs the pending write right
//! away. A timer that wakes after its value was replaced or flushed does nothing.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type WriteFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The write performed once the delay elapses.
pub type Writer<T> = Arc<dyn Fn(T) -> WriteFuture + Send + Sync>;

pub struct Debouncer<T> {
    delay: Duration,
    writer: Writer<T>,
    pending: Arc<Mutex<Option<T>>>,
    generation: Arc<AtomicU64>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, writer: Writer<T>) -> Self {
        Self {
            delay,
            writer,
            pending: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Replaces the pending value and restarts the delay. Requires a Tokio runtime.
    pub fn schedule(&self, value: T) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let delay = self.delay;
        let writer = self.writer.clone();
        let pending = self.pending.clone();
        let generation = self.generation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::Acquire) != ticket {
                return;
            }
            let value = pending.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(value) = value {
                writer(value).await;
            }
        });
    }

    /// Writes the pending value now. Returns whether anything was written.
    pub async fn flush(&self) -> bool {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let value = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        match value {
            Some(value) => {
                (self.writer)(value).await;
                true
            }
            None => false,
        }
    }

    /// Drops the pending value without writing it.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}
