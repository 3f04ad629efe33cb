//! INI configuration file.
//!
//! Values absent from the file keep their compiled defaults, so an empty
//! or partial file is always valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::debug;

use super::keys::ConfigKey;
use super::ConfigError;
use crate::cache::{ModelCacheConfig, OversizePolicy, DEFAULT_MAX_AGE, DEFAULT_MAX_SIZE_BYTES};
use crate::fetch::DEFAULT_TIMEOUT_SECS;
use crate::monitor::{
    MonitorConfig, DEFAULT_FPS_THRESHOLD, DEFAULT_MEMORY_THRESHOLD_BYTES, DEFAULT_SAMPLE_INTERVAL,
};
use crate::preload::{
    PreloadOptions, DEFAULT_DEBOUNCE, DEFAULT_POPULAR_COUNT, DEFAULT_PRELOAD_NEXT,
    DEFAULT_PRELOAD_PREVIOUS,
};

/// Directory name under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "dharmaview";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default config file location: `<config dir>/dharmaview/config.ini`.
///
/// Falls back to the current directory when the platform has no config
/// directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_size: u64,
    pub max_age: Duration,
    pub oversize_policy: OversizePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE_BYTES,
            max_age: DEFAULT_MAX_AGE,
            oversize_policy: OversizePolicy::default(),
        }
    }
}

/// `[monitor]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub fps_threshold: u32,
    pub memory_threshold: u64,
    pub sample_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fps_threshold: DEFAULT_FPS_THRESHOLD,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD_BYTES,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// `[preload]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSettings {
    pub next: u32,
    pub previous: u32,
    pub popular: bool,
    pub popular_count: usize,
    pub debounce: Duration,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            next: DEFAULT_PRELOAD_NEXT,
            previous: DEFAULT_PRELOAD_PREVIOUS,
            popular: true,
            popular_count: DEFAULT_POPULAR_COUNT,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// `[http]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub monitor: MonitorSettings,
    pub preload: PreloadSettings,
    pub http: HttpSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`]. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        let config = Self::from_ini(&ini)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }

    /// Write to [`config_file_path`], creating its directory.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        self.to_ini().write_to_file(path).map_err(io_error)
    }

    /// Model cache settings.
    pub fn cache_config(&self) -> ModelCacheConfig {
        ModelCacheConfig::default()
            .with_max_size(self.cache.max_size)
            .with_max_age(self.cache.max_age)
            .with_oversize_policy(self.cache.oversize_policy)
    }

    /// Performance monitor settings.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::default()
            .with_enabled(self.monitor.enabled)
            .with_fps_threshold(self.monitor.fps_threshold)
            .with_memory_threshold(self.monitor.memory_threshold)
            .with_sample_interval(self.monitor.sample_interval)
    }

    /// Default preload options.
    pub fn preload_options(&self) -> PreloadOptions {
        PreloadOptions::default()
            .with_next(self.preload.next)
            .with_previous(self.preload.previous)
            .with_popular(self.preload.popular)
            .with_popular_count(self.preload.popular_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = ConfigFile::from_ini_str("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.cache_config(), ModelCacheConfig::default());
        assert_eq!(config.preload_options(), PreloadOptions::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let config = ConfigFile::from_ini_str(
            "[cache]\nmax_size = 256MB\noversize_policy = reject\n\n\
             [monitor]\nfps_threshold = 45\n\n\
             [preload]\nnext = 4\npopular = false\n\n\
             [http]\ntimeout_secs = 5\n",
        )
        .unwrap();

        assert_eq!(config.cache.max_size, 256 * 1024 * 1024);
        assert_eq!(config.cache.max_age, DEFAULT_MAX_AGE);
        assert_eq!(config.cache.oversize_policy, OversizePolicy::Reject);
        assert_eq!(config.monitor_config().thresholds.fps, 45);
        assert!(config.monitor.enabled);
        assert_eq!(config.preload_options().next, 4);
        assert!(!config.preload_options().include_popular);
        assert_eq!(config.http.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = ConfigFile::from_ini_str("[cache]\nmax_size = lots\n").unwrap_err();
        assert!(err.to_string().contains("cache.max_size"), "{}", err);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = ConfigFile::from_ini_str("[cache]\ncolour = blue\n[extra]\nx = 1\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[preload]\ndebounce_ms = 750").unwrap();

        let config = ConfigFile::load_from(file.path()).unwrap();
        assert_eq!(config.preload.debounce, Duration::from_millis(750));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.max_size = 64 * 1024 * 1024;
        config.monitor.enabled = false;
        config.preload.popular_count = 3;
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_config_file_path_name() {
        let path = config_file_path();
        assert!(path.ends_with("dharmaview/config.ini"));
    }
}
