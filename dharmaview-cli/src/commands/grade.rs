//! Grade command - score a set of performance metrics.
//!
//! Feeds the given FPS, memory and load time through a performance monitor
//! and prints the resulting grade, rendering settings and suggestions.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use dharmaview::config::format_size;
use dharmaview::monitor::{
    FrameDriver, MetricsUpdate, NoMemoryProbe, OptimizationSettings, PerformanceGrade,
    PerformanceMetrics, PerformanceMonitor,
};

use crate::error::CliError;
use crate::runner::load_config;

/// Arguments for the grade command.
pub struct GradeArgs {
    pub fps: u32,
    pub memory_mb: f64,
    pub load_ms: u64,
    pub json: bool,
}

#[derive(Serialize)]
struct GradeReport {
    metrics: PerformanceMetrics,
    grade: PerformanceGrade,
    settings: OptimizationSettings,
    suggestions: Vec<&'static str>,
}

fn evaluate(monitor: &PerformanceMonitor, args: &GradeArgs) -> Result<GradeReport, CliError> {
    if !args.memory_mb.is_finite() || args.memory_mb < 0.0 {
        return Err(CliError::Config(format!(
            "memory must be a non-negative number of MB, got {}",
            args.memory_mb
        )));
    }

    monitor.update(MetricsUpdate::Fps(args.fps));
    monitor.update(MetricsUpdate::Memory(
        (args.memory_mb * 1024.0 * 1024.0).round() as u64,
    ));
    monitor.update(MetricsUpdate::LoadTime(Duration::from_millis(args.load_ms)));

    Ok(GradeReport {
        metrics: monitor.metrics(),
        grade: monitor.performance_grade(),
        settings: monitor.optimization_settings(),
        suggestions: monitor.optimization_suggestions(),
    })
}

/// Run the grade command.
pub fn run(args: GradeArgs, config_path: Option<&std::path::Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let monitor = PerformanceMonitor::with_memory_probe(
        config.monitor_config().with_frame_driver(FrameDriver::External),
        Arc::new(NoMemoryProbe),
    );

    let report = evaluate(&monitor, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let metrics = &report.metrics;
    println!("Metrics");
    println!("  FPS:        {}", metrics.fps);
    println!("  Memory:     {}", format_size(metrics.memory_usage_bytes));
    println!("  Load time:  {:.0} ms", metrics.load_time_ms());
    println!(
        "  Status:     {}",
        if metrics.is_low_performance {
            "low performance"
        } else {
            "ok"
        }
    );
    println!();
    println!("Grade: {} [{}]", report.grade, report.grade.color);
    println!();

    let settings = &report.settings;
    println!("Recommended settings");
    println!("  Model quality:     {}", settings.model_quality);
    println!("  Animations:        {}", on_off(settings.enable_animations));
    println!("  Shadows:           {}", on_off(settings.enable_shadows));
    println!("  Reflections:       {}", on_off(settings.enable_reflections));
    println!("  Concurrent models: {}", settings.max_concurrent_models);

    if !report.suggestions.is_empty() {
        println!();
        println!("Suggestions");
        for suggestion in &report.suggestions {
            println!("  - {}", suggestion);
        }
    }

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
