//! Performance metrics snapshot and its update rules.
//!
//! Metrics are replaced, never patched: every observation is a
//! [`MetricsUpdate`] applied to the previous snapshot to produce the next.

use std::time::Duration;

use serde::{Serialize, Serializer};

use super::config::Thresholds;

/// Initial FPS before the first window closes.
pub const INITIAL_FPS: u32 = 60;

/// One observation from the sampler or a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsUpdate {
    /// A closed FPS window.
    Fps(u32),
    /// A memory sample in bytes.
    Memory(u64),
    /// A completed model load.
    LoadTime(Duration),
    /// A completed render pass.
    RenderTime(Duration),
}

/// Most recent view of runtime health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    pub fps: u32,
    pub memory_usage_bytes: u64,
    #[serde(rename = "load_time_ms", serialize_with = "serialize_millis")]
    pub load_time: Duration,
    #[serde(rename = "render_time_ms", serialize_with = "serialize_millis")]
    pub render_time: Duration,
    /// `fps` under the FPS threshold or memory over the memory threshold.
    pub is_low_performance: bool,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fps: INITIAL_FPS,
            memory_usage_bytes: 0,
            load_time: Duration::ZERO,
            render_time: Duration::ZERO,
            is_low_performance: false,
        }
    }
}

impl PerformanceMetrics {
    /// Produce the snapshot that follows `update`.
    pub fn apply(&self, update: MetricsUpdate, thresholds: &Thresholds) -> Self {
        let mut next = *self;
        match update {
            MetricsUpdate::Fps(fps) => next.fps = fps,
            MetricsUpdate::Memory(bytes) => next.memory_usage_bytes = bytes,
            MetricsUpdate::LoadTime(elapsed) => next.load_time = elapsed,
            MetricsUpdate::RenderTime(elapsed) => next.render_time = elapsed,
        }
        next.is_low_performance =
            next.fps < thresholds.fps || next.memory_usage_bytes > thresholds.memory_bytes;
        next
    }

    pub fn memory_usage_mb(&self) -> f64 {
        self.memory_usage_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn load_time_ms(&self) -> f64 {
        self.load_time.as_secs_f64() * 1000.0
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
