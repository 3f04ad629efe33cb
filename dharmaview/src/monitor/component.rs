//! Per-component render tracking.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

/// Render time above which a frame is dropped at 60 FPS.
pub const SLOW_RENDER_THRESHOLD: Duration = Duration::from_micros(16_670);

/// Tracks render count and latest render time for one named component.
#[derive(Debug)]
pub struct ComponentPerformance {
    name: String,
    render_count: u64,
    last_render_time: Duration,
    mounted_at: Instant,
}

/// Snapshot returned by [`ComponentPerformance::stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStats {
    pub component_name: String,
    pub render_count: u64,
    pub last_render_time: Duration,
    pub uptime: Duration,
    /// At least one render, and the latest one fit in a 60 FPS frame.
    pub is_healthy: bool,
}

impl ComponentPerformance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            render_count: 0,
            last_render_time: Duration::ZERO,
            mounted_at: Instant::now(),
        }
    }

    pub fn record_render(&mut self, elapsed: Duration) {
        self.render_count += 1;
        self.last_render_time = elapsed;

        if elapsed > SLOW_RENDER_THRESHOLD {
            warn!(
                component = %self.name,
                render_ms = format!("{:.2}", elapsed.as_secs_f64() * 1000.0),
                "Slow render detected"
            );
        }
    }

    pub fn stats(&self) -> ComponentStats {
        ComponentStats {
            component_name: self.name.clone(),
            render_count: self.render_count,
            last_render_time: self.last_render_time,
            uptime: self.mounted_at.elapsed(),
            is_healthy: self.render_count > 0 && self.last_render_time < SLOW_RENDER_THRESHOLD,
        }
    }
}
