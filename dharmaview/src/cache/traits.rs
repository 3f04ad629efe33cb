//! Resolver trait consumed by the preloader and viewers.
//!
//! Consumers only need "give me a playable handle for this URL". Depending
//! on [`ModelResolver`] instead of a concrete `ModelCache<C>` keeps the HTTP
//! client type out of their signatures and lets tests substitute a stub.
//!
//! The trait returns boxed futures so it can be used as `Arc<dyn ModelResolver>`.

use futures::future::BoxFuture;
use tracing::warn;

use super::memory::ModelCache;
use super::types::{CacheStats, ModelHandle};
use crate::fetch::{AsyncHttpClient, FetchError};

/// Resolves model URLs to locally playable handles.
pub trait ModelResolver: Send + Sync {
    /// Return a handle for `url`, downloading it if needed.
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<ModelHandle, FetchError>>;

    /// Current cache statistics.
    fn stats(&self) -> CacheStats;

    /// Warm the cache for `url`, swallowing failures.
    ///
    /// A failed preload is logged and reported as `false`. The model will be
    /// fetched on demand if it is actually viewed.
    fn preload<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self.resolve(url).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(url, error = %e, "Failed to preload model");
                    false
                }
            }
        })
    }
}

impl<C: AsyncHttpClient> ModelResolver for ModelCache<C> {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<ModelHandle, FetchError>> {
        Box::pin(ModelCache::resolve(self, url))
    }

    fn stats(&self) -> CacheStats {
        ModelCache::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ModelCacheConfig;
    use crate::fetch::{FetchFailure, MockHttpClient};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_trait_object_usage() {
        let client = MockHttpClient::new().with_body("https://m.example/a.glb", vec![1u8, 2]);
        let resolver: Arc<dyn ModelResolver> =
            Arc::new(ModelCache::new(ModelCacheConfig::default(), client));

        let handle = resolver.resolve("https://m.example/a.glb").await.unwrap();
        assert_eq!(handle.len(), 2);
        assert_eq!(resolver.stats().entry_count, 1);
    }

    #[tokio::test]
    async fn test_preload_swallows_failure() {
        let client = MockHttpClient::new()
            .with_body("https://m.example/ok.glb", vec![1u8])
            .with_failure("https://m.example/bad.glb", FetchFailure::Timeout);
        let cache = ModelCache::new(ModelCacheConfig::default(), client);

        assert!(cache.preload("https://m.example/ok.glb").await);
        assert!(!cache.preload("https://m.example/bad.glb").await);
        assert_eq!(ModelResolver::stats(&cache).entry_count, 1);
    }
}
