//! Performance scoring, letter grades and suggestions.

use std::fmt;

use serde::Serialize;

use super::metrics::PerformanceMetrics;

/// Letter grade for a 0-100 performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Map a score in `[0, 100]` to its band.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Display color for a status badge.
    pub fn color(&self) -> &'static str {
        match self {
            Grade::A => "green",
            Grade::B => "blue",
            Grade::C => "yellow",
            Grade::D => "orange",
            Grade::F => "red",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Grade::A => "Excellent",
            Grade::B => "Good",
            Grade::C => "Fair",
            Grade::D => "Poor",
            Grade::F => "Critical",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graded view of the current metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceGrade {
    pub grade: Grade,
    pub color: &'static str,
    pub description: &'static str,
    /// Clamped score the grade was derived from.
    pub score: f64,
}

impl PerformanceGrade {
    pub fn from_metrics(metrics: &PerformanceMetrics) -> Self {
        let score = performance_score(metrics);
        let grade = Grade::from_score(score);
        Self {
            grade,
            color: grade.color(),
            description: grade.description(),
            score,
        }
    }
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, score {:.0})", self.grade, self.description, self.score)
    }
}

/// Score metrics from 0 (unusable) to 100 (ideal).
///
/// Starts at 100 and subtracts proportional and flat penalties for low FPS,
/// high memory and slow loads.
pub fn performance_score(metrics: &PerformanceMetrics) -> f64 {
    let mut score = 100.0;

    let fps = f64::from(metrics.fps);
    if fps < 60.0 {
        score -= (60.0 - fps) * 1.5;
    }
    if fps < 30.0 {
        score -= 20.0;
    }
    if fps < 15.0 {
        score -= 30.0;
    }

    let memory_mb = metrics.memory_usage_mb();
    if memory_mb > 100.0 {
        score -= (memory_mb - 100.0) * 0.5;
    }
    if memory_mb > 200.0 {
        score -= 20.0;
    }

    let load_ms = metrics.load_time_ms();
    if load_ms > 3000.0 {
        score -= (load_ms - 3000.0) / 100.0;
    }
    if load_ms > 10_000.0 {
        score -= 20.0;
    }

    score.clamp(0.0, 100.0)
}

/// Human-readable hints for the current metrics.
pub fn optimization_suggestions(metrics: &PerformanceMetrics) -> Vec<&'static str> {
    let mut suggestions = Vec::new();

    if metrics.fps < 30 {
        suggestions.push("Consider lowering 3D model quality");
        suggestions.push("Disable unnecessary visual effects");
    }

    if metrics.memory_usage_mb() > 50.0 {
        suggestions.push("Clear the model cache periodically");
        suggestions.push("Reduce the number of models loaded at once");
    }

    if metrics.load_time_ms() > 5000.0 {
        suggestions.push("Check your internet connection");
        suggestions.push("Use lower-resolution models");
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MIB: u64 = 1024 * 1024;

    fn metrics(fps: u32, memory_mb: u64, load_ms: u64) -> PerformanceMetrics {
        PerformanceMetrics {
            fps,
            memory_usage_bytes: memory_mb * MIB,
            load_time: Duration::from_millis(load_ms),
            ..Default::default()
        }
    }

    #[test]
    fn test_ideal_metrics_grade_a() {
        let grade = PerformanceGrade::from_metrics(&metrics(60, 50, 1000));
        assert_eq!(grade.score, 100.0);
        assert_eq!(grade.grade, Grade::A);
        assert_eq!(grade.color, "green");
        assert_eq!(grade.description, "Excellent");
    }

    #[test]
    fn test_terrible_metrics_grade_f() {
        let grade = PerformanceGrade::from_metrics(&metrics(10, 250, 12_000));
        assert_eq!(grade.score, 0.0);
        assert_eq!(grade.grade, Grade::F);
        assert_eq!(grade.color, "red");
    }

    #[test]
    fn test_fps_penalties() {
        // (60 - 40) * 1.5 = 30
        assert!((performance_score(&metrics(40, 0, 0)) - 70.0).abs() < 1e-9);
        // (60 - 20) * 1.5 + 20 = 80
        assert!((performance_score(&metrics(20, 0, 0)) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_memory_penalties() {
        // (150 - 100) * 0.5 = 25
        assert!((performance_score(&metrics(60, 150, 0)) - 75.0).abs() < 1e-9);
        // (210 - 100) * 0.5 + 20 = 75
        assert!((performance_score(&metrics(60, 210, 0)) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_time_penalties() {
        // (5000 - 3000) / 100 = 20
        assert!((performance_score(&metrics(60, 0, 5000)) - 80.0).abs() < 1e-9);
        // (11000 - 3000) / 100 + 20 = 100
        assert_eq!(performance_score(&metrics(60, 0, 11_000)), 0.0);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.9), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
    }

    #[test]
    fn test_suggestions() {
        assert!(optimization_suggestions(&metrics(60, 10, 100)).is_empty());

        let suggestions = optimization_suggestions(&metrics(20, 60, 6000));
        assert_eq!(suggestions.len(), 6);
        assert!(suggestions.contains(&"Clear the model cache periodically"));
    }

    #[test]
    fn test_grade_display() {
        let grade = PerformanceGrade::from_metrics(&metrics(60, 0, 0));
        assert_eq!(grade.to_string(), "A (Excellent, score 100)");
    }
}
