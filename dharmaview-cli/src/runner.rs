//! Shared command setup: config loading, async runtime and HTTP client.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tracing::info;

use dharmaview::config::{config_file_path, ConfigFile};
use dharmaview::fetch::ReqwestClient;

use crate::error::CliError;

/// Load the config from `--config` if given, otherwise the default location.
///
/// An explicit path that does not exist yet yields the defaults, so
/// `config set --config new.ini` can create it.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) if path.exists() => Ok(ConfigFile::load_from(path)?),
        Some(_) => Ok(ConfigFile::default()),
        None => Ok(ConfigFile::load()?),
    }
}

/// Path a command should read and write.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf).unwrap_or_else(config_file_path)
}

/// Everything an async command needs.
pub struct CliRunner {
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;
        Ok(Self { config, runtime })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            cache_max_size = self.config.cache.max_size,
            http_timeout_secs = self.config.http.timeout.as_secs(),
            "DharmaView starting"
        );
    }

    /// HTTP client using the configured timeout.
    pub fn http_client(&self) -> Result<ReqwestClient, CliError> {
        ReqwestClient::with_timeout(self.config.http.timeout).map_err(CliError::Http)
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
