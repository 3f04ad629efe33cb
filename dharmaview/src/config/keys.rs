//! Typed access to individual configuration keys.
//!
//! Every setting the INI file understands is a [`ConfigKey`]. Loading,
//! saving and the CLI's `config get`/`config set` all go through the same
//! key table, so a setting cannot be readable but not writable.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::file::ConfigFile;
use super::size::{format_size_exact, parse_size};
use super::ConfigError;

/// One configuration setting, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    CacheMaxSize,
    CacheMaxAgeSecs,
    CacheOversizePolicy,
    MonitorEnabled,
    MonitorFpsThreshold,
    MonitorMemoryThreshold,
    MonitorSampleIntervalMs,
    PreloadNext,
    PreloadPrevious,
    PreloadPopular,
    PreloadPopularCount,
    PreloadDebounceMs,
    HttpTimeoutSecs,
}

const ALL_KEYS: [ConfigKey; 13] = [
    ConfigKey::CacheMaxSize,
    ConfigKey::CacheMaxAgeSecs,
    ConfigKey::CacheOversizePolicy,
    ConfigKey::MonitorEnabled,
    ConfigKey::MonitorFpsThreshold,
    ConfigKey::MonitorMemoryThreshold,
    ConfigKey::MonitorSampleIntervalMs,
    ConfigKey::PreloadNext,
    ConfigKey::PreloadPrevious,
    ConfigKey::PreloadPopular,
    ConfigKey::PreloadPopularCount,
    ConfigKey::PreloadDebounceMs,
    ConfigKey::HttpTimeoutSecs,
];

impl ConfigKey {
    /// All keys, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::CacheMaxSize | ConfigKey::CacheMaxAgeSecs | ConfigKey::CacheOversizePolicy => {
                "cache"
            }
            ConfigKey::MonitorEnabled
            | ConfigKey::MonitorFpsThreshold
            | ConfigKey::MonitorMemoryThreshold
            | ConfigKey::MonitorSampleIntervalMs => "monitor",
            ConfigKey::PreloadNext
            | ConfigKey::PreloadPrevious
            | ConfigKey::PreloadPopular
            | ConfigKey::PreloadPopularCount
            | ConfigKey::PreloadDebounceMs => "preload",
            ConfigKey::HttpTimeoutSecs => "http",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::CacheMaxSize => "max_size",
            ConfigKey::CacheMaxAgeSecs => "max_age_secs",
            ConfigKey::CacheOversizePolicy => "oversize_policy",
            ConfigKey::MonitorEnabled => "enabled",
            ConfigKey::MonitorFpsThreshold => "fps_threshold",
            ConfigKey::MonitorMemoryThreshold => "memory_threshold",
            ConfigKey::MonitorSampleIntervalMs => "sample_interval_ms",
            ConfigKey::PreloadNext => "next",
            ConfigKey::PreloadPrevious => "previous",
            ConfigKey::PreloadPopular => "popular",
            ConfigKey::PreloadPopularCount => "popular_count",
            ConfigKey::PreloadDebounceMs => "debounce_ms",
            ConfigKey::HttpTimeoutSecs => "timeout_secs",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as it would be written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::CacheMaxSize => format_size_exact(config.cache.max_size),
            ConfigKey::CacheMaxAgeSecs => config.cache.max_age.as_secs().to_string(),
            ConfigKey::CacheOversizePolicy => config.cache.oversize_policy.to_string(),
            ConfigKey::MonitorEnabled => config.monitor.enabled.to_string(),
            ConfigKey::MonitorFpsThreshold => config.monitor.fps_threshold.to_string(),
            ConfigKey::MonitorMemoryThreshold => format_size_exact(config.monitor.memory_threshold),
            ConfigKey::MonitorSampleIntervalMs => {
                config.monitor.sample_interval.as_millis().to_string()
            }
            ConfigKey::PreloadNext => config.preload.next.to_string(),
            ConfigKey::PreloadPrevious => config.preload.previous.to_string(),
            ConfigKey::PreloadPopular => config.preload.popular.to_string(),
            ConfigKey::PreloadPopularCount => config.preload.popular_count.to_string(),
            ConfigKey::PreloadDebounceMs => config.preload.debounce.as_millis().to_string(),
            ConfigKey::HttpTimeoutSecs => config.http.timeout.as_secs().to_string(),
        }
    }

    /// Parse `value` and store it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::CacheMaxSize => config.cache.max_size = self.parse_size(value)?,
            ConfigKey::CacheMaxAgeSecs => {
                config.cache.max_age = Duration::from_secs(self.parse_number(value)?)
            }
            ConfigKey::CacheOversizePolicy => {
                config.cache.oversize_policy = value
                    .parse()
                    .map_err(|reason: String| self.invalid(value, reason))?
            }
            ConfigKey::MonitorEnabled => config.monitor.enabled = self.parse_bool(value)?,
            ConfigKey::MonitorFpsThreshold => {
                config.monitor.fps_threshold = self.parse_number(value)?
            }
            ConfigKey::MonitorMemoryThreshold => {
                config.monitor.memory_threshold = self.parse_size(value)?
            }
            ConfigKey::MonitorSampleIntervalMs => {
                let millis: u64 = self.parse_number(value)?;
                if millis == 0 {
                    return Err(self.invalid(value, "must be greater than zero"));
                }
                config.monitor.sample_interval = Duration::from_millis(millis)
            }
            ConfigKey::PreloadNext => config.preload.next = self.parse_number(value)?,
            ConfigKey::PreloadPrevious => config.preload.previous = self.parse_number(value)?,
            ConfigKey::PreloadPopular => config.preload.popular = self.parse_bool(value)?,
            ConfigKey::PreloadPopularCount => {
                config.preload.popular_count = self.parse_number(value)?
            }
            ConfigKey::PreloadDebounceMs => {
                config.preload.debounce = Duration::from_millis(self.parse_number(value)?)
            }
            ConfigKey::HttpTimeoutSecs => {
                let secs: u64 = self.parse_number(value)?;
                if secs == 0 {
                    return Err(self.invalid(value, "must be greater than zero"));
                }
                config.http.timeout = Duration::from_secs(secs)
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_number<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value
            .parse()
            .map_err(|_| self.invalid(value, "expected a non-negative integer"))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_size(&self, value: &str) -> Result<u64, ConfigError> {
        parse_size(value).map_err(|e| self.invalid(value, e.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
