//! Bounded recency cache for session views.
//!
//! This crate provides the cache that sits in front of the store:
//! - least-recently-used eviction at a fixed, small capacity
//! - a [`ViewLoader`] hook that fetches on miss
//! - hit/miss/eviction counters
//!
//! The cache is an accelerator, not a source of truth. Cached values are
//! expected to write through on mutation, so eviction never flushes.
//!
//! # Example
//!
//! ```rust,ignore
//! use rally_cache::{CacheConfig, ViewCache};
//!
//! let cache = ViewCache::new(CacheConfig::default().with_max_sessions(5), loader);
//! let view = cache.get_or_load("session-1").await?;
//! ```

mod cache;
mod config;
mod error;
mod loader;

pub use cache::{CacheStats, ViewCache};
pub use config::{CacheConfig, DEFAULT_MAX_SESSIONS};
pub use error::{BoxError, Error, Result};
pub use loader::ViewLoader;
