//! In-memory model cache.
//!
//! `ModelCache` maps a model URL to its downloaded bytes. Lookups never touch
//! the network; [`ModelCache::resolve`] composes lookup, download and insert.
//!
//! The entry map sits behind a `parking_lot::Mutex`. The lock is only held
//! for map operations and never across an `.await`, so two resolves racing
//! for the same URL both download and the later insert wins.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::config::ModelCacheConfig;
use super::store::CacheStore;
use super::types::{CacheStats, ModelHandle};
use crate::fetch::{AsyncHttpClient, FetchError};

/// In-memory cache for downloaded 3D models.
///
/// Construct one per application and share it through an `Arc`; the
/// preloader and viewers receive it by injection.
pub struct ModelCache<C: AsyncHttpClient> {
    store: Mutex<CacheStore>,
    client: C,
    config: ModelCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    handles_issued: AtomicU64,
}

impl<C: AsyncHttpClient> ModelCache<C> {
    /// Create an empty cache that downloads through `client`.
    pub fn new(config: ModelCacheConfig, client: C) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(&config)),
            client,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            handles_issued: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ModelCacheConfig {
        &self.config
    }

    fn issue_handle(&self, url: &str, payload: Bytes) -> ModelHandle {
        let sequence = self.handles_issued.fetch_add(1, Ordering::Relaxed);
        ModelHandle::new(sequence, url, payload)
    }

    /// Look up a live model.
    ///
    /// Counts a hit or a miss. Expired entries count as misses. Never fetches.
    pub fn get(&self, url: &str) -> Option<ModelHandle> {
        let payload = {
            let store = self.store.lock();
            store
                .get(url, Instant::now())
                .map(|entry| entry.payload().clone())
        };

        match payload {
            Some(payload) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(url, size = payload.len(), "Model cache hit");
                Some(self.issue_handle(url, payload))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(url, "Model cache miss");
                None
            }
        }
    }

    /// Check for a live model without touching the hit/miss counters.
    pub fn contains(&self, url: &str) -> bool {
        self.store.lock().contains(url, Instant::now())
    }

    /// Store a model, replacing any previous payload for the same URL.
    ///
    /// Runs an expiry pass first, then evicts the oldest entries until the
    /// new payload fits the budget.
    pub fn set(&self, url: &str, payload: Bytes) {
        let size = payload.len();
        let outcome = self.store.lock().insert(url, payload, Instant::now());

        if outcome.expired > 0 {
            self.expirations
                .fetch_add(outcome.expired as u64, Ordering::Relaxed);
            debug!(count = outcome.expired, "Expired cached models");
        }
        if !outcome.evicted.is_empty() {
            self.evictions
                .fetch_add(outcome.evicted.len() as u64, Ordering::Relaxed);
            debug!(evicted = ?outcome.evicted, "Evicted cached models to make room");
        }
        if outcome.oversized {
            warn!(
                url,
                size,
                max_size = self.config.max_size_bytes,
                policy = %self.config.oversize_policy,
                "Model larger than the whole cache budget"
            );
        }
        if outcome.stored {
            debug!(url, size, replaced = outcome.replaced, "Cached model");
        }
    }

    /// Remove one model. Returns whether it was present.
    pub fn remove(&self, url: &str) -> bool {
        self.store.lock().remove(url).is_some()
    }

    /// Drop every expired model now instead of waiting for the next insert.
    pub fn cleanup_expired(&self) -> usize {
        let expired = self.store.lock().remove_expired(Instant::now());
        self.expirations
            .fetch_add(expired as u64, Ordering::Relaxed);
        expired
    }

    /// Return a handle for `url`, downloading it on a miss.
    ///
    /// A failed download is returned to the caller and leaves the cache
    /// untouched. There is no retry here.
    pub async fn resolve(&self, url: &str) -> Result<ModelHandle, FetchError> {
        if let Some(handle) = self.get(url) {
            return Ok(handle);
        }

        let started = Instant::now();
        let payload = self.client.get(url).await.map_err(|cause| {
            warn!(url, error = %cause, "Failed to load model");
            FetchError::new(url, cause)
        })?;

        debug!(
            url,
            size = payload.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Downloaded model"
        );

        self.set(url, payload.clone());
        Ok(self.issue_handle(url, payload))
    }

    /// Drop all models and reset every counter.
    pub fn clear(&self) {
        self.store.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let (total_size, entry_count, max_size) = {
            let store = self.store.lock();
            (store.total_size(), store.len(), store.max_size())
        };

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            total_size,
            entry_count,
            max_size,
        }
    }
}
