//! Preload command - warm a model cache around a gallery position.
//!
//! Schedules a preload the way a viewer would, honoring the configured
//! debounce, waits for every download to settle, and prints what was
//! requested and how the cache ended up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use dharmaview::cache::{CacheStats, ModelCache};
use dharmaview::config::{format_size, ConfigFile};
use dharmaview::fetch::AsyncHttpClient;
use dharmaview::preload::{ModelCatalog, ModelPreloader, PreloadOptions, PreloadPriority};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the preload command.
pub struct PreloadArgs {
    pub catalog: PathBuf,
    pub current: u32,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub popular_count: Option<usize>,
    pub no_popular: bool,
    pub high: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PreloadedModel {
    url: String,
    cached: bool,
}

#[derive(Debug, Serialize)]
struct PreloadReport {
    current_id: u32,
    priority: PreloadPriority,
    debounce_ms: u64,
    models: Vec<PreloadedModel>,
    cache: CacheStats,
}

/// Preload options: CLI flags first, then config, then defaults.
fn resolve_options(args: &PreloadArgs, config: &ConfigFile) -> PreloadOptions {
    let mut options = config.preload_options();
    if let Some(next) = args.next {
        options = options.with_next(next);
    }
    if let Some(previous) = args.previous {
        options = options.with_previous(previous);
    }
    if let Some(count) = args.popular_count {
        options = options.with_popular_count(count);
    }
    if args.no_popular {
        options = options.with_popular(false);
    }
    if args.high {
        options = options.with_priority(PreloadPriority::High);
    }
    options
}

/// Schedule a debounced preload for `current_id` and wait until it settles.
async fn warm<C: AsyncHttpClient + 'static>(
    cache: Arc<ModelCache<C>>,
    catalog: Arc<ModelCatalog>,
    current_id: u32,
    options: PreloadOptions,
    debounce: Duration,
) -> PreloadReport {
    let preloader =
        Arc::new(ModelPreloader::new(cache.clone(), catalog).with_debounce(debounce));
    let planned = preloader.plan(current_id, &options);

    preloader.schedule_preload(current_id, options.clone());
    preloader.wait_idle().await;

    PreloadReport {
        current_id,
        priority: options.priority,
        debounce_ms: debounce.as_millis() as u64,
        models: planned
            .into_iter()
            .map(|request| PreloadedModel {
                cached: cache.contains(&request.url),
                url: request.url,
            })
            .collect(),
        cache: cache.stats(),
    }
}

/// Run the preload command.
pub fn run(runner: &CliRunner, args: PreloadArgs) -> Result<(), CliError> {
    runner.log_startup("preload");
    let config = runner.config();

    let catalog = Arc::new(ModelCatalog::load(&args.catalog)?);
    if catalog.get(args.current).is_none() {
        return Err(CliError::Config(format!(
            "entry {} is not in catalog {}",
            args.current,
            args.catalog.display()
        )));
    }

    let options = resolve_options(&args, config);
    let cache = Arc::new(ModelCache::new(config.cache_config(), runner.http_client()?));
    let report = runner.block_on(warm(
        cache,
        catalog,
        args.current,
        options,
        config.preload.debounce,
    ));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Preloaded around entry {} ({} priority, {} ms debounce)",
        report.current_id, report.priority, report.debounce_ms
    );
    if report.models.is_empty() {
        println!("  Nothing to preload");
    }
    for model in &report.models {
        let status = if model.cached { "cached" } else { "failed" };
        println!("  [{}] {}", status, model.url);
    }

    let stats = &report.cache;
    println!();
    println!(
        "Cache: {} entries, {} of {}",
        stats.entry_count,
        format_size(stats.total_size),
        format_size(stats.max_size)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use dharmaview::cache::ModelCacheConfig;
    use dharmaview::fetch::FetchFailure;
    use dharmaview::preload::CatalogEntry;
    use futures::future::BoxFuture;
    use tokio::time::Instant;

    /// Serves every URL except those ending in `missing.glb`.
    struct StaticClient;

    impl AsyncHttpClient for StaticClient {
        fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchFailure>> {
            let missing = url.ends_with("missing.glb");
            Box::pin(async move {
                if missing {
                    Err(FetchFailure::Status {
                        code: 404,
                        reason: "Not Found".to_string(),
                    })
                } else {
                    Ok(Bytes::from_static(b"glTF"))
                }
            })
        }
    }

    fn args() -> PreloadArgs {
        PreloadArgs {
            catalog: PathBuf::from("catalog.json"),
            current: 1,
            next: None,
            previous: None,
            popular_count: None,
            no_popular: false,
            high: false,
            json: false,
        }
    }

    #[test]
    fn test_options_default_to_config() {
        let mut config = ConfigFile::default();
        config.preload.next = 3;

        let options = resolve_options(&args(), &config);
        assert_eq!(options.next, 3);
        assert_eq!(options.previous, 1);
        assert!(options.include_popular);
        assert_eq!(options.priority, PreloadPriority::Low);
    }

    #[test]
    fn test_flags_override_config() {
        let config = ConfigFile::default();
        let options = resolve_options(
            &PreloadArgs {
                next: Some(0),
                previous: Some(4),
                popular_count: Some(2),
                no_popular: true,
                high: true,
                ..args()
            },
            &config,
        );

        assert_eq!(options.next, 0);
        assert_eq!(options.previous, 4);
        assert_eq!(options.popular_count, 2);
        assert!(!options.include_popular);
        assert_eq!(options.priority, PreloadPriority::High);
    }

    #[test]
    fn test_unknown_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, r#"[{"id": 1, "name": "Tara", "modelUrl": "https://m.example/1.glb"}]"#)
            .unwrap();

        let runner = CliRunner::new(Some(&dir.path().join("config.ini"))).unwrap();
        let result = run(
            &runner,
            PreloadArgs {
                catalog,
                current: 9,
                ..args()
            },
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_waits_for_debounce_and_downloads() {
        let catalog = Arc::new(ModelCatalog::new(vec![
            CatalogEntry::new(1, "Tara", Some("https://m.example/1.glb")),
            CatalogEntry::new(2, "Manjushri", Some("https://m.example/2.glb")),
            CatalogEntry::new(3, "Vajrapani", Some("https://m.example/missing.glb")),
        ]));
        let cache = Arc::new(ModelCache::new(ModelCacheConfig::default(), StaticClient));
        let options = PreloadOptions::default().with_popular(false).with_next(2);

        let started = Instant::now();
        let report = warm(
            cache.clone(),
            catalog,
            1,
            options,
            Duration::from_millis(750),
        )
        .await;

        assert!(started.elapsed() >= Duration::from_millis(750));
        assert_eq!(report.debounce_ms, 750);
        let cached: Vec<_> = report.models.iter().map(|m| (m.url.as_str(), m.cached)).collect();
        assert_eq!(
            cached,
            vec![
                ("https://m.example/2.glb", true),
                ("https://m.example/missing.glb", false),
            ]
        );
        assert_eq!(report.cache.entry_count, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["priority"], "low");
        assert_eq!(json["models"][0]["cached"], true);
        assert!(json["cache"]["hit_rate"].is_number());
    }
}
