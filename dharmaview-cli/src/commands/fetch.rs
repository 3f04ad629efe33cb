//! Fetch command - resolve model URLs through a model cache.
//!
//! Useful for checking that models are reachable and for seeing the cache
//! at work: with `--repeat 2` the second round is served from memory.

use std::time::Instant;

use serde::Serialize;

use dharmaview::cache::{CacheStats, ModelCache};
use dharmaview::config::{format_size, parse_size};
use dharmaview::fetch::FetchError;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub urls: Vec<String>,
    pub repeat: u32,
    pub max_size: Option<String>,
    pub json: bool,
}

/// Result of resolving one URL in one round.
#[derive(Debug, Serialize)]
struct FetchOutcome {
    round: u32,
    url: String,
    /// Blob reference on success.
    reference: Option<String>,
    size: Option<u64>,
    elapsed_ms: u64,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FetchReport {
    outcomes: Vec<FetchOutcome>,
    cache: CacheStats,
}

/// Run the fetch command.
pub fn run(runner: &CliRunner, args: FetchArgs) -> Result<(), CliError> {
    runner.log_startup("fetch");

    let mut cache_config = runner.config().cache_config();
    if let Some(max_size) = &args.max_size {
        cache_config = cache_config.with_max_size(parse_size(max_size)?);
    }
    let cache = ModelCache::new(cache_config, runner.http_client()?);

    let mut outcomes = Vec::new();
    let mut failed = 0;
    let mut last_error: Option<FetchError> = None;

    runner.block_on(async {
        for round in 1..=args.repeat.max(1) {
            for url in &args.urls {
                let started = Instant::now();
                let result = cache.resolve(url).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match result {
                    Ok(handle) => outcomes.push(FetchOutcome {
                        round,
                        url: url.clone(),
                        reference: Some(handle.to_string()),
                        size: Some(handle.len() as u64),
                        elapsed_ms,
                        error: None,
                    }),
                    Err(e) => {
                        outcomes.push(FetchOutcome {
                            round,
                            url: url.clone(),
                            reference: None,
                            size: None,
                            elapsed_ms,
                            error: Some(e.cause.to_string()),
                        });
                        failed += 1;
                        last_error = Some(e);
                    }
                }
            }
        }
    });

    let report = FetchReport {
        outcomes,
        cache: cache.stats(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.repeat > 1);
    }

    match last_error {
        Some(last) => Err(CliError::Fetch { failed, last }),
        None => Ok(()),
    }
}

fn print_report(report: &FetchReport, show_rounds: bool) {
    let mut round = 0;
    for outcome in &report.outcomes {
        if show_rounds && outcome.round != round {
            round = outcome.round;
            println!("Round {}:", round);
        }
        match (&outcome.reference, &outcome.error) {
            (Some(reference), _) => println!(
                "  {} -> {} ({}, {} ms)",
                outcome.url,
                reference,
                format_size(outcome.size.unwrap_or(0)),
                outcome.elapsed_ms
            ),
            (None, error) => println!(
                "  {} -> FAILED: {}",
                outcome.url,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let stats = &report.cache;
    println!();
    println!("Cache statistics");
    println!("  Entries:   {}", stats.entry_count);
    println!(
        "  Size:      {} of {}",
        format_size(stats.total_size),
        format_size(stats.max_size)
    );
    println!(
        "  Hits:      {} / Misses: {} ({:.1}% hit rate)",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );
    println!("  Evictions: {}", stats.evictions);
}
