//! Predictive model preloading.
//!
//! While a user browses the gallery, the models of the entries around the
//! current one (and a small set of popular entries) are pushed through the
//! [`ModelResolver`] so they are already cached when the user gets there.
//!
//! # Debounce
//!
//! Navigation arrives in bursts. [`ModelPreloader::schedule_preload`] only
//! starts a batch once navigation has been quiet for the debounce interval
//! (500 ms by default). Every new call cancels the pending one, so a burst
//! of calls produces a single batch for the last position.
//!
//! # Priority
//!
//! - [`PreloadPriority::High`]: the batch awaits every resolution and
//!   reports how many succeeded.
//! - [`PreloadPriority::Low`]: resolutions are spawned and the batch returns
//!   immediately. [`ModelPreloader::wait_idle`] waits for them when a
//!   caller needs to, such as a one-shot CLI run.
//!
//! A failed preload never fails the batch. It is logged by the resolver and
//! the model is fetched on demand if it is actually viewed.

mod catalog;
mod config;

pub use catalog::{CatalogEntry, CatalogError, ModelCatalog};
pub use config::{
    PreloadOptions, PreloadPriority, PreloadRequest, DEFAULT_DEBOUNCE, DEFAULT_POPULAR_COUNT,
    DEFAULT_PRELOAD_NEXT, DEFAULT_PRELOAD_PREVIOUS,
};

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::ModelResolver;

/// Outcome of one preload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSummary {
    pub current_id: u32,
    /// URLs handed to the resolver, in request order.
    pub requested: Vec<String>,
    pub priority: PreloadPriority,
    /// Successful resolutions. Only counted for high priority batches.
    pub succeeded: usize,
    /// Failed resolutions. Only counted for high priority batches.
    pub failed: usize,
}

impl PreloadSummary {
    /// Whether the batch waited for its resolutions.
    pub fn awaited(&self) -> bool {
        self.priority == PreloadPriority::High
    }
}

/// Warms the model cache around the current gallery position.
pub struct ModelPreloader {
    resolver: Arc<dyn ModelResolver>,
    catalog: Arc<ModelCatalog>,
    debounce: Duration,
    pending: Mutex<Option<CancellationToken>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
    batches_started: AtomicU64,
}

impl ModelPreloader {
    pub fn new(resolver: Arc<dyn ModelResolver>, catalog: Arc<ModelCatalog>) -> Self {
        Self {
            resolver,
            catalog,
            debounce: DEFAULT_DEBOUNCE,
            pending: Mutex::new(None),
            in_flight: Mutex::new(Vec::new()),
            batches_started: AtomicU64::new(0),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Number of batches started so far.
    pub fn batches_started(&self) -> u64 {
        self.batches_started.load(Ordering::Relaxed)
    }

    /// Scheduled batches and background resolutions not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|task| !task.is_finished());
        in_flight.push(handle);
    }

    /// Wait until every scheduled batch and background resolution is done.
    ///
    /// A batch that is still in its debounce window is waited for too,
    /// unless it gets cancelled.
    pub async fn wait_idle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.in_flight.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Preload task failed");
                }
            }
        }
    }

    /// Preload requests for `current_id`.
    ///
    /// Order is the following entries, then the preceding ones, then the
    /// popular set. Entries without a model and ids outside the catalog are
    /// skipped, and each URL appears at most once. Only catalog entries are
    /// visited, so large counts cost no more than the catalog size.
    pub fn plan(&self, current_id: u32, options: &PreloadOptions) -> Vec<PreloadRequest> {
        let mut seen = HashSet::new();
        let mut requests = Vec::new();
        let mut push = |url: &str| {
            if seen.insert(url.to_string()) {
                requests.push(PreloadRequest {
                    url: url.to_string(),
                    priority: options.priority,
                });
            }
        };

        if let (Some(first), true) = (current_id.checked_add(1), options.next > 0) {
            let last = current_id.saturating_add(options.next);
            for entry in self.catalog.entries_in(first..=last) {
                if let Some(url) = entry.available_model() {
                    push(url);
                }
            }
        }

        if let (Some(last), true) = (current_id.checked_sub(1), options.previous > 0) {
            let first = current_id.saturating_sub(options.previous);
            for entry in self.catalog.entries_in(first..=last).rev() {
                if let Some(url) = entry.available_model() {
                    push(url);
                }
            }
        }

        if options.include_popular {
            for url in self.catalog.popular_models(options.popular_count) {
                push(url);
            }
        }

        requests
    }

    /// Preload the models around `current_id` now.
    pub async fn preload_adjacent(
        &self,
        current_id: u32,
        options: &PreloadOptions,
    ) -> PreloadSummary {
        let requests = self.plan(current_id, options);
        self.batches_started.fetch_add(1, Ordering::Relaxed);

        let mut summary = PreloadSummary {
            current_id,
            requested: requests.iter().map(|r| r.url.clone()).collect(),
            priority: options.priority,
            succeeded: 0,
            failed: 0,
        };

        if requests.is_empty() {
            debug!(current_id, "Nothing to preload");
            return summary;
        }

        info!(
            current_id,
            models = requests.len(),
            priority = %options.priority,
            "Preloading adjacent models"
        );

        match options.priority {
            PreloadPriority::High => {
                let results = futures::future::join_all(
                    requests.iter().map(|request| self.resolver.preload(&request.url)),
                )
                .await;

                summary.succeeded = results.iter().filter(|ok| **ok).count();
                summary.failed = results.len() - summary.succeeded;

                info!(
                    current_id,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Preload batch complete"
                );
            }
            PreloadPriority::Low => {
                for request in requests {
                    let resolver = Arc::clone(&self.resolver);
                    self.track(tokio::spawn(async move {
                        resolver.preload(&request.url).await;
                    }));
                }
            }
        }

        summary
    }

    /// Schedule a preload for `current_id` once navigation goes quiet.
    ///
    /// Returns immediately. A pending schedule that has not started yet is
    /// cancelled. Resolutions already started by an earlier batch run to
    /// completion. Outside a Tokio runtime this logs a warning and does
    /// nothing.
    pub fn schedule_preload(self: &Arc<Self>, current_id: u32, options: PreloadOptions) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(current_id, "No async runtime, preload not scheduled");
                return;
            }
        };

        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let preloader = Arc::clone(self);
        let debounce = self.debounce;
        let task = handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(current_id, "Preload superseded");
                    return;
                }
                _ = tokio::time::sleep(debounce) => {}
            }

            preloader.preload_adjacent(current_id, &options).await;
        });
        self.track(task);
    }

    /// Cancel a scheduled preload that has not started yet.
    pub fn cancel_pending(&self) {
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for ModelPreloader {
    fn drop(&mut self) {
        if let Some(token) = self.pending.get_mut().take() {
            token.cancel();
        }
    }
}

impl std::fmt::Debug for ModelPreloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPreloader")
            .field("catalog_entries", &self.catalog.len())
            .field("debounce", &self.debounce)
            .field("batches_started", &self.batches_started())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, ModelHandle};
    use crate::fetch::{FetchError, FetchFailure};
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use tokio::time::Instant;

    /// Resolver that records every call and fails for configured URLs.
    #[derive(Default)]
    struct RecordingResolver {
        calls: Mutex<Vec<(String, Instant)>>,
        failing: HashSet<String>,
    }

    impl RecordingResolver {
        fn failing(urls: &[&str]) -> Self {
            Self {
                failing: urls.iter().map(|u| u.to_string()).collect(),
                ..Default::default()
            }
        }

        fn urls(&self) -> Vec<String> {
            self.calls.lock().iter().map(|(url, _)| url.clone()).collect()
        }

        fn times(&self) -> Vec<Instant> {
            self.calls.lock().iter().map(|(_, at)| *at).collect()
        }
    }

    impl ModelResolver for RecordingResolver {
        fn resolve<'a>(
            &'a self,
            url: &'a str,
        ) -> BoxFuture<'a, Result<ModelHandle, FetchError>> {
            self.calls.lock().push((url.to_string(), Instant::now()));
            let result = if self.failing.contains(url) {
                Err(FetchError::new(url, FetchFailure::Timeout))
            } else {
                Ok(ModelHandle::new(0, url, Bytes::from_static(b"glTF")))
            };
            Box::pin(async move { result })
        }

        fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    fn url(id: u32) -> String {
        format!("https://m.example/{}.glb", id)
    }

    /// Entries 1..=8; entry 3 has no model.
    fn catalog() -> Arc<ModelCatalog> {
        let entries = (1..=8)
            .map(|id| {
                let model = url(id);
                CatalogEntry::new(id, format!("entry {}", id), (id != 3).then_some(model.as_str()))
            })
            .collect();
        Arc::new(ModelCatalog::new(entries))
    }

    fn preloader(resolver: Arc<RecordingResolver>) -> Arc<ModelPreloader> {
        Arc::new(ModelPreloader::new(resolver, catalog()))
    }

    #[test]
    fn test_plan_order_and_dedupe() {
        let preloader = preloader(Arc::new(RecordingResolver::default()));
        let plan = preloader.plan(4, &PreloadOptions::default());
        let urls: Vec<_> = plan.iter().map(|r| r.url.clone()).collect();

        // next 5, 6; previous 3 has no model; popular 1, 2, 4 (5 and 6 already queued)
        assert_eq!(urls, vec![url(5), url(6), url(1), url(2), url(4)]);
        assert!(plan.iter().all(|r| r.priority == PreloadPriority::Low));
    }

    #[test]
    fn test_plan_at_catalog_edges() {
        let preloader = preloader(Arc::new(RecordingResolver::default()));
        let options = PreloadOptions::default().with_popular(false);

        assert_eq!(
            preloader
                .plan(8, &options)
                .into_iter()
                .map(|r| r.url)
                .collect::<Vec<_>>(),
            vec![url(7)]
        );
        assert_eq!(
            preloader
                .plan(0, &options.clone().with_previous(3))
                .into_iter()
                .map(|r| r.url)
                .collect::<Vec<_>>(),
            vec![url(1), url(2)]
        );
        assert!(preloader.plan(100, &options).is_empty());
    }

    #[test]
    fn test_plan_with_huge_counts_stays_within_catalog() {
        let preloader = preloader(Arc::new(RecordingResolver::default()));
        let options = PreloadOptions::default()
            .with_next(u32::MAX)
            .with_previous(u32::MAX)
            .with_popular(false);

        let started = std::time::Instant::now();
        let urls: Vec<_> = preloader.plan(4, &options).into_iter().map(|r| r.url).collect();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(urls, vec![url(5), url(6), url(7), url(8), url(2), url(1)]);

        let urls: Vec<_> = preloader
            .plan(u32::MAX, &options)
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(urls.len(), 7);
    }

    #[test]
    fn test_plan_popular_count() {
        let preloader = preloader(Arc::new(RecordingResolver::default()));
        let options = PreloadOptions::default()
            .with_next(0)
            .with_previous(0)
            .with_popular_count(2);

        let urls: Vec<_> = preloader.plan(6, &options).into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec![url(1), url(2)]);
    }

    #[tokio::test]
    async fn test_high_priority_waits_and_counts() {
        let resolver = Arc::new(RecordingResolver::failing(&[&url(6)]));
        let preloader = preloader(Arc::clone(&resolver));
        let options = PreloadOptions::default()
            .with_popular(false)
            .with_priority(PreloadPriority::High);

        let summary = preloader.preload_adjacent(4, &options).await;

        assert!(summary.awaited());
        assert_eq!(summary.requested, vec![url(5), url(6)]);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(resolver.urls(), vec![url(5), url(6)]);
        assert_eq!(preloader.batches_started(), 1);
    }

    #[tokio::test]
    async fn test_low_priority_returns_before_resolutions() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));
        let options = PreloadOptions::default().with_popular(false);

        let summary = preloader.preload_adjacent(1, &options).await;
        assert!(!summary.awaited());
        assert_eq!(summary.requested, vec![url(2)]);
        assert_eq!(summary.succeeded, 0);
        assert!(resolver.urls().is_empty());

        tokio::task::yield_now().await;
        assert_eq!(resolver.urls(), vec![url(2)]);
    }

    #[tokio::test]
    async fn test_wait_idle_covers_background_resolutions() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));

        let summary = preloader.preload_adjacent(4, &PreloadOptions::default()).await;
        preloader.wait_idle().await;

        assert_eq!(resolver.urls().len(), summary.requested.len());
        assert_eq!(preloader.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_covers_debounce_window() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));
        let start = Instant::now();

        preloader.schedule_preload(1, PreloadOptions::default().with_popular(false));
        assert_eq!(preloader.in_flight(), 1);
        preloader.wait_idle().await;

        assert!(start.elapsed() >= DEFAULT_DEBOUNCE);
        assert_eq!(resolver.urls(), vec![url(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_produces_single_batch() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));
        let options = PreloadOptions::default().with_popular(false);
        let start = Instant::now();

        preloader.schedule_preload(1, options.clone());
        tokio::time::sleep(Duration::from_millis(40)).await;
        preloader.schedule_preload(2, options.clone());
        tokio::time::sleep(Duration::from_millis(40)).await;
        preloader.schedule_preload(5, options.clone());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(resolver.urls().is_empty(), "fired before the quiet period");

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(preloader.batches_started(), 1);
        assert_eq!(resolver.urls(), vec![url(6), url(7), url(4)]);
        for at in resolver.times() {
            let elapsed = at - start;
            assert!(
                elapsed >= Duration::from_millis(580) && elapsed < Duration::from_millis(600),
                "batch fired at {:?}",
                elapsed
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_produce_a_batch() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));
        let options = PreloadOptions::default().with_popular(false).with_previous(0);

        preloader.schedule_preload(1, options.clone());
        tokio::time::sleep(Duration::from_millis(700)).await;
        preloader.schedule_preload(4, options);
        tokio::time::sleep(Duration::from_millis(700)).await;

        assert_eq!(preloader.batches_started(), 2);
        assert_eq!(resolver.urls(), vec![url(2), url(5), url(6)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));

        preloader.schedule_preload(1, PreloadOptions::default());
        preloader.cancel_pending();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(preloader.batches_started(), 0);
        assert!(resolver.urls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_scheduled_batch() {
        let resolver = Arc::new(RecordingResolver::failing(&[&url(2)]));
        let preloader = Arc::new(
            ModelPreloader::new(resolver.clone(), catalog())
                .with_debounce(Duration::from_millis(100)),
        );

        preloader.schedule_preload(1, PreloadOptions::default().with_priority(PreloadPriority::High));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // 2 fails and 3 has no model; the popular set still resolves
        assert_eq!(preloader.batches_started(), 1);
        assert_eq!(resolver.urls(), vec![url(2), url(1), url(4), url(5), url(6)]);
    }

    #[test]
    fn test_schedule_outside_runtime_is_noop() {
        let resolver = Arc::new(RecordingResolver::default());
        let preloader = preloader(Arc::clone(&resolver));
        preloader.schedule_preload(1, PreloadOptions::default());
        assert_eq!(preloader.batches_started(), 0);
    }
}
