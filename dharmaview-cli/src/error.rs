//! CLI error type.

use std::fmt;

use dharmaview::config::ConfigError;
use dharmaview::fetch::{FetchError, FetchFailure};
use dharmaview::preload::CatalogError;

/// Errors surfaced by CLI commands. Every variant exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration or command line values.
    Config(String),
    /// Config file could not be read, parsed or written.
    ConfigFile(ConfigError),
    Catalog(CatalogError),
    /// HTTP client could not be built.
    Http(FetchFailure),
    /// One or more downloads failed.
    Fetch { failed: usize, last: FetchError },
    Runtime(std::io::Error),
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Catalog(e) => write!(f, "{}", e),
            CliError::Http(e) => write!(f, "{}", e),
            CliError::Fetch { failed, last } => {
                write!(f, "{} download(s) failed, last error: {}", failed, last)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Http(e) => Some(e),
            CliError::Fetch { last, .. } => Some(last),
            CliError::Runtime(e) => Some(e),
            CliError::Config(_) | CliError::Output(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
