//! Model cache configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default memory budget for cached models (100 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Default maximum age of a cached model (24 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// What to do with a single payload larger than the whole budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Empty the cache and store the payload anyway. The budget is exceeded
    /// until the next insert, which evicts the oversized entry first.
    #[default]
    StoreAnyway,

    /// Never cache the payload. `resolve` still hands it out, fetched fresh
    /// every time.
    Reject,
}

impl OversizePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversizePolicy::StoreAnyway => "store",
            OversizePolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "store" | "store_anyway" => Ok(OversizePolicy::StoreAnyway),
            "reject" => Ok(OversizePolicy::Reject),
            other => Err(format!(
                "unknown oversize policy '{}' (expected 'store' or 'reject')",
                other
            )),
        }
    }
}

/// Configuration for [`ModelCache`](super::ModelCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCacheConfig {
    /// Total payload budget in bytes.
    pub max_size_bytes: u64,

    /// Entries older than this are treated as misses and dropped on the
    /// next cleanup pass.
    pub max_age: Duration,

    /// Handling of payloads larger than `max_size_bytes`.
    pub oversize_policy: OversizePolicy,
}

impl Default for ModelCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_age: DEFAULT_MAX_AGE,
            oversize_policy: OversizePolicy::default(),
        }
    }
}

impl ModelCacheConfig {
    /// Set the memory budget.
    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    /// Set the maximum entry age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the oversized payload policy.
    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = policy;
        self
    }
}
