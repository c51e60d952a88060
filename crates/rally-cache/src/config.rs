//! Configuration for the view cache.

/// Default number of views kept before eviction.
pub const DEFAULT_MAX_SESSIONS: usize = 5;

/// Configuration for the view cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached views. Values below 1 are treated as 1.
    pub max_sessions: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of views to cache.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }
}
