//! Model download abstraction
//!
//! The cache never talks to the network directly. It goes through an
//! [`AsyncHttpClient`] so tests can inject a mock and production code can
//! use [`ReqwestClient`].
//!
//! ```ignore
//! use dharmaview::fetch::ReqwestClient;
//! use dharmaview::cache::{ModelCache, ModelCacheConfig};
//!
//! let client = ReqwestClient::new()?;
//! let cache = ModelCache::new(ModelCacheConfig::default(), client);
//! let handle = cache.resolve("https://models.example/tara.glb").await?;
//! ```

mod error;
mod http;

pub use error::{FetchError, FetchFailure};
pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
pub use http::tests::MockHttpClient;
