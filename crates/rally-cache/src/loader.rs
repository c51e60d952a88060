//! Miss handler for the view cache.
//!
//! The [`ViewLoader`] trait decouples the cache from any particular store.
//! Its associated `Value` type is what the cache keeps in memory, typically
//! a cheap, cloneable handle onto a persisted record.

use crate::error::Result;

/// Fetches values the cache does not hold.
pub trait ViewLoader: Send + Sync {
    /// The value type stored in the cache.
    type Value: Clone + Send + Sync + 'static;

    /// Load a value by key.
    ///
    /// Return `Ok(None)` if nothing exists under `key`; the cache reports
    /// that as [`Error::NotFound`](crate::Error::NotFound).
    fn load(&self, key: &str) -> Result<Option<Self::Value>>;

    /// Called after `key` is pushed out by a newer entry.
    ///
    /// Purely informational; there is nothing to flush.
    fn on_evict(&self, _key: &str) {}
}
