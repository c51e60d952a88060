//! View cache with least-recently-used eviction.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::loader::ViewLoader;

/// Inner state protected by RwLock.
struct CacheInner<L: ViewLoader> {
    lru: LruCache<String, L::Value>,
    loader: L,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Bounded recency cache in front of a [`ViewLoader`].
///
/// - A hit moves the entry to the most-recently-used end.
/// - A miss loads through the loader and inserts at the most-recently-used
///   end, evicting the least-recently-used entry once over capacity.
///
/// Clones share the same cache.
pub struct ViewCache<L: ViewLoader> {
    inner: Arc<RwLock<CacheInner<L>>>,
    config: CacheConfig,
}

impl<L: ViewLoader> ViewCache<L> {
    pub fn new(config: CacheConfig, loader: L) -> Self {
        let cap = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);

        let inner = CacheInner {
            lru: LruCache::new(cap),
            loader,
            hits: 0,
            misses: 0,
            evictions: 0,
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Effective capacity (never below 1).
    pub fn capacity(&self) -> usize {
        self.config.max_sessions.max(1)
    }

    /// Get the current number of cached views.
    pub async fn len(&self) -> usize {
        self.inner.read().await.lru.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.lru.is_empty()
    }

    /// Get a view from cache or load it.
    ///
    /// The write lock is held across the load so two concurrent misses on
    /// the same key load once.
    pub async fn get_or_load(&self, key: &str) -> Result<L::Value> {
        let mut inner = self.inner.write().await;

        if let Some(value) = inner.lru.get(key) {
            let value = value.clone();
            inner.hits += 1;
            trace!(key = %key, "View found in cache");
            return Ok(value);
        }

        inner.misses += 1;
        debug!(key = %key, "View cache miss, loading");

        let value = inner
            .loader
            .load(key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))?;
        Self::push(&mut inner, key, value.clone());
        Ok(value)
    }

    /// Insert a view at the most-recently-used end.
    ///
    /// Returns the key that was evicted to make room, if any.
    pub async fn insert(&self, key: &str, value: L::Value) -> Option<String> {
        let mut inner = self.inner.write().await;
        Self::push(&mut inner, key, value)
    }

    fn push(inner: &mut CacheInner<L>, key: &str, value: L::Value) -> Option<String> {
        let evicted = match inner.lru.push(key.to_string(), value) {
            // `push` also returns the old entry when replacing the same key
            Some((old_key, _)) if old_key != key => Some(old_key),
            _ => None,
        };

        if let Some(evicted_key) = &evicted {
            inner.evictions += 1;
            debug!(key = %evicted_key, "Evicting least recently used view");
            inner.loader.on_evict(evicted_key);
        }

        trace!(key = %key, cache_size = inner.lru.len(), "View inserted into cache");
        evicted
    }

    /// Check if a key is cached (without loading or touching it).
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.read().await.lru.contains(key)
    }

    /// Peek at a cached view without updating recency.
    pub async fn peek(&self, key: &str) -> Option<L::Value> {
        self.inner.read().await.lru.peek(key).cloned()
    }

    /// Drop a key from the cache. Returns the cached view, if any.
    pub async fn invalidate(&self, key: &str) -> Option<L::Value> {
        let removed = self.inner.write().await.lru.pop(key);
        if removed.is_some() {
            debug!(key = %key, "View invalidated from cache");
        }
        removed
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.inner.write().await.lru.clear();
    }

    /// Cached keys, least recently used first.
    pub async fn list_cached(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut keys: Vec<String> = inner.lru.iter().map(|(k, _)| k.clone()).collect();
        // LruCache iterates most recent first
        keys.reverse();
        keys
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            size: inner.lru.len(),
            capacity: self.capacity(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

impl<L: ViewLoader> Clone for ViewCache<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached views.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Lookups served from the cache.
    pub hits: u64,

    /// Lookups that went to the loader.
    pub misses: u64,

    /// Entries pushed out by newer ones.
    pub evictions: u64,
}
