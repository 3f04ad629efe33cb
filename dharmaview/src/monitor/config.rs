//! Performance monitor configuration.

use std::time::Duration;

/// Default FPS below which performance counts as low.
pub const DEFAULT_FPS_THRESHOLD: u32 = 30;

/// Default memory usage above which performance counts as low (100 MiB).
pub const DEFAULT_MEMORY_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// Default FPS window and memory sampling cadence.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Default internal frame tick, roughly one 60 Hz display refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_micros(16_667);

/// Who reports presented frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDriver {
    /// The monitor ticks itself at `refresh_interval`, like a display
    /// refresh callback. Measures how promptly the runtime schedules work.
    Internal { refresh_interval: Duration },

    /// A renderer calls `record_frame` once per presented frame.
    External,
}

impl Default for FrameDriver {
    fn default() -> Self {
        FrameDriver::Internal {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Thresholds that decide `is_low_performance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub fps: u32,
    pub memory_bytes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS_THRESHOLD,
            memory_bytes: DEFAULT_MEMORY_THRESHOLD_BYTES,
        }
    }
}

/// Configuration for [`PerformanceMonitor`](super::PerformanceMonitor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// When false, sampling never starts and frames are ignored.
    pub enable_monitoring: bool,
    pub thresholds: Thresholds,
    /// FPS window length and memory sampling period.
    pub sample_interval: Duration,
    pub frame_driver: FrameDriver,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enable_monitoring: true,
            thresholds: Thresholds::default(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            frame_driver: FrameDriver::default(),
        }
    }
}

impl MonitorConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enable_monitoring = enabled;
        self
    }

    pub fn with_fps_threshold(mut self, fps: u32) -> Self {
        self.thresholds.fps = fps;
        self
    }

    pub fn with_memory_threshold(mut self, bytes: u64) -> Self {
        self.thresholds.memory_bytes = bytes;
        self
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn with_frame_driver(mut self, driver: FrameDriver) -> Self {
        self.frame_driver = driver;
        self
    }
}
