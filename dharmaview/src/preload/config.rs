//! Preload options.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Default number of following entries to warm.
pub const DEFAULT_PRELOAD_NEXT: u32 = 2;

/// Default number of preceding entries to warm.
pub const DEFAULT_PRELOAD_PREVIOUS: u32 = 1;

/// Default size of the popular set.
pub const DEFAULT_POPULAR_COUNT: usize = 5;

/// Quiet time required after the last navigation before preloading.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// How a preload batch relates to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadPriority {
    /// Wait for every resolution before the batch counts as done.
    High,
    /// Fire the resolutions in the background and return at once.
    #[default]
    Low,
}

impl fmt::Display for PreloadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreloadPriority::High => f.write_str("high"),
            PreloadPriority::Low => f.write_str("low"),
        }
    }
}

/// Which neighbors of the current entry to warm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadOptions {
    pub next: u32,
    pub previous: u32,
    /// Also warm the first `popular_count` entries that have a model.
    pub include_popular: bool,
    pub popular_count: usize,
    pub priority: PreloadPriority,
}

impl Default for PreloadOptions {
    fn default() -> Self {
        Self {
            next: DEFAULT_PRELOAD_NEXT,
            previous: DEFAULT_PRELOAD_PREVIOUS,
            include_popular: true,
            popular_count: DEFAULT_POPULAR_COUNT,
            priority: PreloadPriority::default(),
        }
    }
}

impl PreloadOptions {
    pub fn with_next(mut self, next: u32) -> Self {
        self.next = next;
        self
    }

    pub fn with_previous(mut self, previous: u32) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_popular(mut self, include: bool) -> Self {
        self.include_popular = include;
        self
    }

    pub fn with_popular_count(mut self, count: usize) -> Self {
        self.popular_count = count;
        self
    }

    pub fn with_priority(mut self, priority: PreloadPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// One model to warm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadRequest {
    pub url: String,
    pub priority: PreloadPriority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PreloadOptions::default();
        assert_eq!(options.next, 2);
        assert_eq!(options.previous, 1);
        assert!(options.include_popular);
        assert_eq!(options.popular_count, 5);
        assert_eq!(options.priority, PreloadPriority::Low);
    }

    #[test]
    fn test_options_builder() {
        let options = PreloadOptions::default()
            .with_next(4)
            .with_previous(0)
            .with_popular(false)
            .with_popular_count(2)
            .with_priority(PreloadPriority::High);

        assert_eq!(options.next, 4);
        assert_eq!(options.previous, 0);
        assert!(!options.include_popular);
        assert_eq!(options.popular_count, 2);
        assert_eq!(options.priority.to_string(), "high");
    }
}
