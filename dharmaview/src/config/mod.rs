//! Configuration file handling.
//!
//! Settings are layered: compiled defaults, then the INI file (see
//! [`config_file_path`]), then whatever the caller overrides on top.
//!
//! ```ini
//! [cache]
//! max_size = 100MB
//! max_age_secs = 86400
//! oversize_policy = store
//!
//! [monitor]
//! enabled = true
//! fps_threshold = 30
//! memory_threshold = 100MB
//! sample_interval_ms = 1000
//!
//! [preload]
//! next = 2
//! previous = 1
//! popular = true
//! popular_count = 5
//! debounce_ms = 500
//!
//! [http]
//! timeout_secs = 30
//! ```

mod file;
mod keys;
mod size;

pub use file::{
    config_file_path, CacheSettings, ConfigFile, HttpSettings, MonitorSettings, PreloadSettings,
    CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
pub use keys::ConfigKey;
pub use size::{format_size, parse_size};

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading, parsing or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}
