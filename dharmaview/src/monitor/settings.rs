//! Auto-optimization settings derived from metrics.

use std::fmt;

use serde::Serialize;

use super::metrics::PerformanceMetrics;

/// Rendering fidelity for 3D models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelQuality {
    Low,
    Medium,
    High,
}

impl ModelQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelQuality::Low => "low",
            ModelQuality::Medium => "medium",
            ModelQuality::High => "high",
        }
    }
}

impl fmt::Display for ModelQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a viewer should enable on mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimizationSettings {
    pub model_quality: ModelQuality,
    pub enable_animations: bool,
    pub enable_shadows: bool,
    pub enable_reflections: bool,
    pub max_concurrent_models: u32,
}

impl OptimizationSettings {
    /// Full fidelity, used whenever performance is not low.
    pub const FULL: OptimizationSettings = OptimizationSettings {
        model_quality: ModelQuality::High,
        enable_animations: true,
        enable_shadows: true,
        enable_reflections: true,
        max_concurrent_models: 3,
    };

    /// Derive settings from the current metrics.
    ///
    /// Each visual feature has its own FPS floor so quality degrades in
    /// steps: reflections go first, then shadows, then animations.
    pub fn from_metrics(metrics: &PerformanceMetrics) -> Self {
        if !metrics.is_low_performance {
            return Self::FULL;
        }

        let fps = metrics.fps;
        Self {
            model_quality: if fps < 20 {
                ModelQuality::Low
            } else {
                ModelQuality::Medium
            },
            enable_animations: fps > 25,
            enable_shadows: fps > 30,
            enable_reflections: fps > 35,
            max_concurrent_models: if fps < 20 { 1 } else { 2 },
        }
    }
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self::FULL
    }
}
