//! Model asset cache.
//!
//! Downloaded 3D models are kept in memory, keyed by their source URL, under
//! a total size budget and a maximum age.
//!
//! # Architecture
//!
//! ```text
//! ModelResolver (trait) ◄── ModelCache<C: AsyncHttpClient>
//!                             ├── Mutex<CacheStore>   entries, insertion order, size
//!                             ├── atomic counters     hits, misses, evictions, expirations
//!                             └── C                   downloads on miss
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dharmaview::cache::{ModelCache, ModelCacheConfig};
//! use dharmaview::fetch::ReqwestClient;
//!
//! let cache = ModelCache::new(ModelCacheConfig::default(), ReqwestClient::new()?);
//! let handle = cache.resolve("https://models.example/tara.glb").await?;
//! println!("{} ({} bytes)", handle, handle.len());
//! println!("{}", cache.stats());
//! ```

mod config;
mod memory;
mod store;
mod traits;
mod types;

pub use config::{ModelCacheConfig, OversizePolicy, DEFAULT_MAX_AGE, DEFAULT_MAX_SIZE_BYTES};
pub use memory::ModelCache;
pub use traits::ModelResolver;
pub use types::{CacheEntry, CacheStats, ModelHandle};
