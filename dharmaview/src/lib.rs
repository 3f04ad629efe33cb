//! DharmaView - model asset caching and adaptive rendering support
//!
//! This library provides the client-side plumbing behind the DharmaView 3D
//! gallery: downloading `.glb` models once and serving them from memory,
//! watching runtime performance to pick rendering quality, and warming the
//! cache ahead of the user's navigation.
//!
//! # Modules
//!
//! - [`fetch`]: HTTP download of model payloads
//! - [`cache`]: size-bounded, expiring in-memory model cache
//! - [`monitor`]: FPS and memory sampling, quality settings, grading
//! - [`preload`]: debounced predictive preloading around a gallery position
//! - [`config`]: INI configuration file
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dharmaview::cache::{ModelCache, ModelCacheConfig, ModelResolver};
//! use dharmaview::fetch::ReqwestClient;
//! use dharmaview::preload::{ModelCatalog, ModelPreloader, PreloadOptions};
//!
//! let cache = Arc::new(ModelCache::new(ModelCacheConfig::default(), ReqwestClient::new()?));
//! let handle = cache.resolve("https://models.example/tara.glb").await?;
//!
//! let catalog = Arc::new(ModelCatalog::load("catalog.json".as_ref())?);
//! let preloader = Arc::new(ModelPreloader::new(cache.clone(), catalog));
//! preloader.schedule_preload(2, PreloadOptions::default());
//! ```

pub mod cache;
pub mod config;
pub mod fetch;
pub mod monitor;
pub mod preload;
