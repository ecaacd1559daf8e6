//! Thumbnail cache keyed by `(tab id, url)`.
//!
//! Entries older than the TTL read as absent. Writes are idempotent per key,
//! so concurrent captures of the same tab may race: last writer wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::preview::PreviewImage;
use crate::types::tab::{TabId, TabRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub tab_id: TabId,
    pub url: String,
}

impl CacheKey {
    pub fn new(tab_id: TabId, url: impl Into<String>) -> Self {
        Self {
            tab_id,
            url: url.into(),
        }
    }

    pub fn for_tab(tab: &TabRecord) -> Self {
        Self::new(tab.id, tab.url.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailCacheEntry {
    pub image: PreviewImage,
    pub captured_at: Instant,
}

pub struct ThumbnailCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, ThumbnailCacheEntry>>,
}

impl ThumbnailCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, ThumbnailCacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &CacheKey) -> Option<PreviewImage> {
        self.get_at(key, Instant::now())
    }

    /// Lookup relative to an explicit clock reading.
    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<PreviewImage> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now.saturating_duration_since(entry.captured_at) < self.ttl => {
                Some(entry.image.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, image: PreviewImage) {
        self.insert_at(key, image, Instant::now());
    }

    pub fn insert_at(&self, key: CacheKey, image: PreviewImage, captured_at: Instant) {
        self.lock()
            .insert(key, ThumbnailCacheEntry { image, captured_at });
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
