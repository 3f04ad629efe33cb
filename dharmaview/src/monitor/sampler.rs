//! Windowed FPS counter.

use std::time::Duration;

use tokio::time::Instant;

/// Counts frames and closes a window once `sample_interval` has elapsed.
///
/// Plain windowed average: `fps = frames * 1000 / elapsed_ms`, rounded.
/// No smoothing between windows.
#[derive(Debug, Clone)]
pub struct FpsWindow {
    sample_interval: Duration,
    frames: u64,
    window_start: Instant,
}

impl FpsWindow {
    pub fn new(sample_interval: Duration, now: Instant) -> Self {
        Self {
            sample_interval,
            frames: 0,
            window_start: now,
        }
    }

    /// Start a fresh window at `now`, discarding counted frames.
    pub fn reset(&mut self, now: Instant) {
        self.frames = 0;
        self.window_start = now;
    }

    /// Count one frame presented at `now`.
    ///
    /// Returns the window's FPS when this frame closes it.
    pub fn record_frame(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.sample_interval || elapsed.is_zero() {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = (self.frames as f64 * 1000.0 / elapsed_ms).round() as u32;

        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
