//! Runtime performance monitoring and adaptive quality.
//!
//! The monitor keeps a [`PerformanceMetrics`] snapshot up to date from two
//! background tasks and from viewer reports, and derives rendering hints
//! from it.
//!
//! # Architecture
//!
//! ```text
//! frame ticker (or renderer) ──record_frame──► FpsWindow ──Fps──┐
//! memory sampler ──────────── MemoryProbe ─────────── Memory ───┤
//! viewer ── record_load_time / RenderSpan::stop ── LoadTime ────┤
//!                                                               ▼
//!                                    PerformanceMetrics::apply (snapshot)
//!                                                               │
//!                  optimization_settings / performance_grade ◄──┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dharmaview::monitor::{MonitorConfig, PerformanceMonitor};
//!
//! let monitor = Arc::new(PerformanceMonitor::new(MonitorConfig::default()));
//! monitor.start_sampling();
//!
//! let started = tokio::time::Instant::now();
//! let handle = cache.resolve(url).await?;
//! monitor.record_load_time(started);
//!
//! let settings = monitor.optimization_settings();
//! ```

mod component;
mod config;
mod grade;
mod memory;
mod metrics;
mod sampler;
mod settings;

pub use component::{ComponentPerformance, ComponentStats, SLOW_RENDER_THRESHOLD};
pub use config::{
    FrameDriver, MonitorConfig, Thresholds, DEFAULT_FPS_THRESHOLD,
    DEFAULT_MEMORY_THRESHOLD_BYTES, DEFAULT_REFRESH_INTERVAL, DEFAULT_SAMPLE_INTERVAL,
};
pub use grade::{optimization_suggestions, performance_score, Grade, PerformanceGrade};
pub use memory::{MemoryProbe, MonitoringUnavailable, NoMemoryProbe, ProcessMemoryProbe};
pub use metrics::{MetricsUpdate, PerformanceMetrics, INITIAL_FPS};
pub use sampler::FpsWindow;
pub use settings::{ModelQuality, OptimizationSettings};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Continuously updated, best-effort view of runtime health.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    metrics: RwLock<PerformanceMetrics>,
    fps_window: Mutex<FpsWindow>,
    memory_probe: Arc<dyn MemoryProbe>,
    sampling: Mutex<Option<CancellationToken>>,
    memory_unavailable_reported: AtomicBool,
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("config", &self.config)
            .field("metrics", &*self.metrics.read())
            .field("sampling", &self.is_sampling())
            .finish_non_exhaustive()
    }
}

impl PerformanceMonitor {
    /// Create a monitor that samples this process's resident memory.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_memory_probe(config, Arc::new(ProcessMemoryProbe))
    }

    pub fn with_memory_probe(config: MonitorConfig, memory_probe: Arc<dyn MemoryProbe>) -> Self {
        let fps_window = FpsWindow::new(config.sample_interval, Instant::now());
        Self {
            config,
            metrics: RwLock::new(PerformanceMetrics::default()),
            fps_window: Mutex::new(fps_window),
            memory_probe,
            sampling: Mutex::new(None),
            memory_unavailable_reported: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enable_monitoring
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling.lock().is_some()
    }

    /// Current metrics snapshot.
    pub fn metrics(&self) -> PerformanceMetrics {
        *self.metrics.read()
    }

    /// Apply one observation to the metrics snapshot.
    pub fn update(&self, update: MetricsUpdate) -> PerformanceMetrics {
        let mut metrics = self.metrics.write();
        *metrics = metrics.apply(update, &self.config.thresholds);
        *metrics
    }

    /// Start the frame ticker and memory sampler.
    ///
    /// Does nothing when monitoring is disabled, when already sampling, or
    /// when called outside a Tokio runtime.
    pub fn start_sampling(self: &Arc<Self>) {
        if !self.config.enable_monitoring {
            debug!("Performance monitoring disabled, not sampling");
            return;
        }

        let mut sampling = self.sampling.lock();
        if sampling.is_some() {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Cannot start performance sampling outside a Tokio runtime");
                return;
            }
        };

        let token = CancellationToken::new();
        self.fps_window.lock().reset(Instant::now());

        if let FrameDriver::Internal { refresh_interval } = self.config.frame_driver {
            runtime.spawn(run_frame_ticker(
                Arc::downgrade(self),
                refresh_interval,
                token.clone(),
            ));
        }
        runtime.spawn(run_memory_sampler(
            Arc::downgrade(self),
            self.config.sample_interval,
            token.clone(),
        ));

        *sampling = Some(token);
        info!(
            sample_interval_ms = self.config.sample_interval.as_millis() as u64,
            frame_driver = ?self.config.frame_driver,
            "Performance sampling started"
        );
    }

    /// Stop both samplers. Safe to call when not sampling.
    pub fn stop_sampling(&self) {
        if let Some(token) = self.sampling.lock().take() {
            token.cancel();
            info!("Performance sampling stopped");
        }
    }

    /// Count one presented frame; closes the FPS window when it is due.
    pub fn record_frame(&self) {
        if !self.config.enable_monitoring {
            return;
        }

        let fps = self.fps_window.lock().record_frame(Instant::now());
        if let Some(fps) = fps {
            let metrics = self.update(MetricsUpdate::Fps(fps));
            debug!(fps, low = metrics.is_low_performance, "FPS sample");
        }
    }

    /// Take one memory sample now.
    ///
    /// An unavailable probe is reported once and otherwise ignored.
    pub fn sample_memory(&self) {
        match self.memory_probe.sample() {
            Ok(bytes) => {
                self.update(MetricsUpdate::Memory(bytes));
            }
            Err(e) => {
                if !self.memory_unavailable_reported.swap(true, Ordering::Relaxed) {
                    debug!(error = %e, "Continuing with FPS-only metrics");
                }
            }
        }
    }

    /// Record a completed model load that began at `started_at`.
    pub fn record_load_time(&self, started_at: impl Into<Instant>) -> Duration {
        let elapsed = started_at.into().elapsed();
        self.update(MetricsUpdate::LoadTime(elapsed));
        elapsed
    }

    /// Begin timing a render pass; stop the returned span where it ends.
    pub fn record_render_span(&self) -> RenderSpan<'_> {
        RenderSpan {
            monitor: self,
            started: Instant::now(),
        }
    }

    pub fn optimization_settings(&self) -> OptimizationSettings {
        OptimizationSettings::from_metrics(&self.metrics())
    }

    pub fn performance_grade(&self) -> PerformanceGrade {
        PerformanceGrade::from_metrics(&self.metrics())
    }

    pub fn optimization_suggestions(&self) -> Vec<&'static str> {
        optimization_suggestions(&self.metrics())
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        if let Some(token) = self.sampling.get_mut().take() {
            token.cancel();
        }
    }
}

/// An in-progress render measurement.
#[must_use = "stop the span where the render work ends"]
pub struct RenderSpan<'a> {
    monitor: &'a PerformanceMonitor,
    started: Instant,
}

impl RenderSpan<'_> {
    /// End the span, record it as the latest render time and return it.
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.monitor.update(MetricsUpdate::RenderTime(elapsed));
        elapsed
    }
}

async fn run_frame_ticker(
    monitor: Weak<PerformanceMonitor>,
    refresh_interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => match monitor.upgrade() {
                Some(monitor) => monitor.record_frame(),
                None => break,
            },
        }
    }
}

async fn run_memory_sampler(
    monitor: Weak<PerformanceMonitor>,
    sample_interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + sample_interval, sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => match monitor.upgrade() {
                Some(monitor) => monitor.sample_memory(),
                None => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    const MIB: u64 = 1024 * 1024;

    /// Memory probe returning a settable value and counting samples.
    struct FixedMemoryProbe {
        bytes: AtomicU64,
        samples: AtomicU64,
    }

    impl FixedMemoryProbe {
        fn new(bytes: u64) -> Arc<Self> {
            Arc::new(Self {
                bytes: AtomicU64::new(bytes),
                samples: AtomicU64::new(0),
            })
        }
    }

    impl MemoryProbe for FixedMemoryProbe {
        fn sample(&self) -> Result<u64, MonitoringUnavailable> {
            self.samples.fetch_add(1, Ordering::Relaxed);
            Ok(self.bytes.load(Ordering::Relaxed))
        }
    }

    fn external_config() -> MonitorConfig {
        MonitorConfig::default().with_frame_driver(FrameDriver::External)
    }

    #[test]
    fn test_initial_state() {
        let monitor = PerformanceMonitor::with_memory_probe(external_config(), Arc::new(NoMemoryProbe));
        assert_eq!(monitor.metrics(), PerformanceMetrics::default());
        assert_eq!(monitor.optimization_settings(), OptimizationSettings::FULL);
        assert_eq!(monitor.performance_grade().grade, Grade::A);
        assert!(!monitor.is_sampling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_frames_produce_fps() {
        let monitor = PerformanceMonitor::with_memory_probe(external_config(), Arc::new(NoMemoryProbe));
        monitor.fps_window.lock().reset(Instant::now());

        // 20 frames spread over one second
        for _ in 0..20 {
            tokio::time::advance(Duration::from_millis(50)).await;
            monitor.record_frame();
        }

        let metrics = monitor.metrics();
        assert_eq!(metrics.fps, 20);
        assert!(metrics.is_low_performance);
        assert_eq!(monitor.optimization_settings().model_quality, ModelQuality::Medium);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_monitor_ignores_frames_and_sampling() {
        let monitor = Arc::new(PerformanceMonitor::with_memory_probe(
            external_config().with_enabled(false),
            Arc::new(NoMemoryProbe),
        ));

        monitor.start_sampling();
        assert!(!monitor.is_sampling());

        for _ in 0..10 {
            tokio::time::advance(Duration::from_millis(200)).await;
            monitor.record_frame();
        }
        assert_eq!(monitor.metrics().fps, INITIAL_FPS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_sampling_is_idempotent() {
        let probe = FixedMemoryProbe::new(10 * MIB);
        let monitor = Arc::new(PerformanceMonitor::with_memory_probe(
            external_config(),
            probe.clone(),
        ));

        monitor.start_sampling();
        monitor.start_sampling();
        assert!(monitor.is_sampling());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        // One sampler task: one sample per elapsed second.
        assert_eq!(probe.samples.load(Ordering::Relaxed), 3);
        assert_eq!(monitor.metrics().memory_usage_bytes, 10 * MIB);

        monitor.stop_sampling();
        monitor.stop_sampling();
        assert!(!monitor.is_sampling());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.samples.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_pressure_degrades_settings() {
        let probe = FixedMemoryProbe::new(150 * MIB);
        let monitor = Arc::new(PerformanceMonitor::with_memory_probe(
            external_config(),
            probe.clone(),
        ));

        monitor.sample_memory();
        assert!(monitor.metrics().is_low_performance);
        // FPS is still the initial 60, so every toggle stays on at medium quality.
        let settings = monitor.optimization_settings();
        assert_eq!(settings.model_quality, ModelQuality::Medium);
        assert!(settings.enable_reflections);
        assert_eq!(settings.max_concurrent_models, 2);

        probe.bytes.store(20 * MIB, Ordering::Relaxed);
        monitor.sample_memory();
        assert_eq!(monitor.optimization_settings(), OptimizationSettings::FULL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_memory_keeps_fps_only() {
        let monitor = Arc::new(PerformanceMonitor::with_memory_probe(
            external_config(),
            Arc::new(NoMemoryProbe),
        ));

        monitor.start_sampling();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(monitor.is_sampling());
        assert_eq!(monitor.metrics().memory_usage_bytes, 0);
        assert!(monitor.memory_unavailable_reported.load(Ordering::Relaxed));
        monitor.stop_sampling();
    }

    #[tokio::test(start_paused = true)]
    async fn test_internal_ticker_measures_fps() {
        let config = MonitorConfig::default().with_frame_driver(FrameDriver::Internal {
            refresh_interval: Duration::from_millis(20),
        });
        let monitor = Arc::new(PerformanceMonitor::with_memory_probe(config, Arc::new(NoMemoryProbe)));

        monitor.start_sampling();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        monitor.stop_sampling();

        let fps = monitor.metrics().fps;
        assert!((48..=52).contains(&fps), "expected ~50 fps, got {}", fps);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_load_time() {
        let monitor = PerformanceMonitor::with_memory_probe(external_config(), Arc::new(NoMemoryProbe));
        let started = Instant::now();

        tokio::time::advance(Duration::from_millis(4000)).await;
        let elapsed = monitor.record_load_time(started);

        assert_eq!(elapsed, Duration::from_millis(4000));
        assert_eq!(monitor.metrics().load_time, elapsed);
        // (4000 - 3000) / 100 = 10 points off
        assert_eq!(monitor.performance_grade().grade, Grade::A);
        assert!((monitor.performance_grade().score - 90.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_span_records_where_stopped() {
        let monitor = PerformanceMonitor::with_memory_probe(external_config(), Arc::new(NoMemoryProbe));

        let span = monitor.record_render_span();
        tokio::time::advance(Duration::from_millis(12)).await;
        let elapsed = span.stop();
        tokio::time::advance(Duration::from_millis(100)).await;

        assert_eq!(elapsed, Duration::from_millis(12));
        assert_eq!(monitor.metrics().render_time, Duration::from_millis(12));
    }

    #[test]
    fn test_start_outside_runtime_is_noop() {
        let monitor = Arc::new(PerformanceMonitor::with_memory_probe(
            external_config(),
            Arc::new(NoMemoryProbe),
        ));
        monitor.start_sampling();
        assert!(!monitor.is_sampling());
    }
}
