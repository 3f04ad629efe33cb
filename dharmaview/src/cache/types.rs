//! Cache entry, handle and statistics types.

use std::fmt;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tokio::time::Instant;

/// A cached model payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    key: String,
    payload: Bytes,
    stored_at: Instant,
    sequence: u64,
}

impl CacheEntry {
    pub(crate) fn new(key: String, payload: Bytes, stored_at: Instant, sequence: u64) -> Self {
        Self {
            key,
            payload,
            stored_at,
            sequence,
        }
    }

    /// Source URL the payload was downloaded from.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Insertion time, used for expiry.
    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Insertion order; lower values are evicted first.
    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Locally playable reference to a cached model.
///
/// The reference string plays the role of a browser object URL: it is unique
/// per handle handed out and can be given to a renderer as a media source.
/// The handle also carries the payload, so the renderer never re-fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    reference: String,
    source_url: String,
    payload: Bytes,
}

impl ModelHandle {
    pub(crate) fn new(sequence: u64, source_url: &str, payload: Bytes) -> Self {
        Self {
            reference: format!("blob:dharmaview/{}", sequence),
            source_url: source_url.to_string(),
            payload,
        }
    }

    /// The opaque reference string.
    pub fn as_str(&self) -> &str {
        &self.reference
    }

    /// URL the payload was originally fetched from.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

/// Point-in-time cache statistics.
///
/// Serializes with the derived `hit_rate` alongside the counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing live.
    pub misses: u64,
    /// Entries removed to make room.
    pub evictions: u64,
    /// Entries removed for exceeding the maximum age.
    pub expirations: u64,
    /// Bytes currently stored.
    pub total_size: u64,
    pub entry_count: usize,
    pub max_size: u64,
}

impl CacheStats {
    /// Hit rate as a fraction in `[0.0, 1.0]`; zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Serialize for CacheStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CacheStats", 8)?;
        state.serialize_field("hits", &self.hits)?;
        state.serialize_field("misses", &self.misses)?;
        state.serialize_field("hit_rate", &self.hit_rate())?;
        state.serialize_field("evictions", &self.evictions)?;
        state.serialize_field("expirations", &self.expirations)?;
        state.serialize_field("total_size", &self.total_size)?;
        state.serialize_field("entry_count", &self.entry_count)?;
        state.serialize_field("max_size", &self.max_size)?;
        state.end()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {}/{} bytes, {} hits, {} misses ({:.1}% hit rate), {} evicted, {} expired",
            self.entry_count,
            self.total_size,
            self.max_size,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.expirations
        )
    }
}
