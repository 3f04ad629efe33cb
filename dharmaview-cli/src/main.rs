//! DharmaView CLI - Command-line interface
//!
//! This binary exposes the DharmaView library: fetching models through the
//! model cache, warming the cache around a gallery position, grading
//! performance metrics and managing the config file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use commands::grade::GradeArgs;
use commands::preload::PreloadArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "dharmaview", version, about = "Model cache and performance tools for the DharmaView gallery")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve model URLs through the model cache
    Fetch {
        /// Model URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,

        /// Fetch every URL this many times
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        /// Cache budget override (e.g., 50MB)
        #[arg(long)]
        max_size: Option<String>,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grade a set of performance metrics
    Grade {
        /// Frames per second
        #[arg(long)]
        fps: u32,

        /// Memory usage in MB
        #[arg(long, default_value_t = 0.0)]
        memory_mb: f64,

        /// Model load time in milliseconds
        #[arg(long, default_value_t = 0)]
        load_ms: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preload the models around a gallery entry
    Preload {
        /// Catalog JSON file
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,

        /// Id of the entry being viewed
        #[arg(long)]
        current: u32,

        /// Number of following entries to preload
        #[arg(long)]
        next: Option<u32>,

        /// Number of preceding entries to preload
        #[arg(long)]
        previous: Option<u32>,

        /// Size of the popular set
        #[arg(long)]
        popular_count: Option<usize>,

        /// Skip the popular set
        #[arg(long)]
        no_popular: bool,

        /// Wait for each download and report its outcome
        #[arg(long)]
        high: bool,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "dharmaview=debug" } else { "dharmaview=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Fetch {
            urls,
            repeat,
            max_size,
            json,
        } => {
            let runner = CliRunner::new(config_path)?;
            commands::fetch::run(
                &runner,
                FetchArgs {
                    urls,
                    repeat,
                    max_size,
                    json,
                },
            )
        }
        Commands::Grade {
            fps,
            memory_mb,
            load_ms,
            json,
        } => commands::grade::run(
            GradeArgs {
                fps,
                memory_mb,
                load_ms,
                json,
            },
            config_path,
        ),
        Commands::Preload {
            catalog,
            current,
            next,
            previous,
            popular_count,
            no_popular,
            high,
            json,
        } => {
            let runner = CliRunner::new(config_path)?;
            commands::preload::run(
                &runner,
                PreloadArgs {
                    catalog,
                    current,
                    next,
                    previous,
                    popular_count,
                    no_popular,
                    high,
                    json,
                },
            )
        }
        Commands::Config(command) => commands::config::run(command, config_path),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
