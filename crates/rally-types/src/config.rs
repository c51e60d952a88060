//! Configuration traits for decoupled config passing between crates.
//!
//! Components depend on the capability they need (cache sizing, backend
//! selection) rather than on the full configuration structure in
//! `rally-config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Base trait for all configuration types.
pub trait ConfigProvider: Clone + Send + Sync + 'static {}

/// Resolver cache sizing.
pub trait HasCacheConfig: ConfigProvider {
    /// Maximum number of session views held per resolver.
    fn max_cached_sessions(&self) -> usize;
}

/// Persistence backend selection.
pub trait HasStoreConfig: ConfigProvider {
    /// Which backend to open.
    fn store_kind(&self) -> StoreKind;

    /// Document path for [`StoreKind::File`].
    fn store_path(&self) -> PathBuf;
}

/// Available persistence backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local maps; nothing survives a restart.
    Memory,
    /// A single JSON document on disk.
    #[default]
    File,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" | "in-memory" => Ok(Self::Memory),
            "file" | "file-backed" | "json" => Ok(Self::File),
            other => Err(format!("unknown store backend '{other}' (expected memory or file)")),
        }
    }
}

/// Default configuration values.
pub mod defaults {
    /// Session views kept per resolver before least-recently-used eviction.
    pub const MAX_CACHED_SESSIONS: usize = 5;

    /// File name of the JSON document inside the data directory.
    pub const STORE_FILE: &str = "rally.json";
}

/// Standalone config for callers that don't load a config file.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub max_cached_sessions: usize,
    pub store_kind: StoreKind,
    pub store_path: PathBuf,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            max_cached_sessions: defaults::MAX_CACHED_SESSIONS,
            store_kind: StoreKind::Memory,
            store_path: PathBuf::from(defaults::STORE_FILE),
        }
    }
}

impl ConfigProvider for StaticConfig {}

impl HasCacheConfig for StaticConfig {
    fn max_cached_sessions(&self) -> usize {
        self.max_cached_sessions
    }
}

impl HasStoreConfig for StaticConfig {
    fn store_kind(&self) -> StoreKind {
        self.store_kind
    }

    fn store_path(&self) -> PathBuf {
        self.store_path.clone()
    }
}
