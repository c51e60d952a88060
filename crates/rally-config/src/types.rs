//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [session]                # defaults for every new session
//! capacity = 5
//! fire_when_full = false
//!
//! [session.messages]       # notification templates
//! confirmed = "You're in for {name}."
//!
//! [templates.raid]         # named presets layered on the defaults
//! name = "Raid Night"
//! capacity = 8
//!
//! [store]
//! backend = "file"         # or "memory"
//! path = "/var/lib/rally/rally.json"
//!
//! [cache]
//! max_sessions = 5
//!
//! [logging]
//! level = "debug"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use rally_types::{
    ConfigProvider, HasCacheConfig, HasStoreConfig, SessionOverrides, SessionParameters,
    StoreKind, config_defaults,
};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RallyConfig {
    /// Overrides applied to the built-in session defaults.
    pub session: SessionOverrides,

    /// Named templates, applied on top of the session defaults.
    pub templates: BTreeMap<String, SessionOverrides>,

    /// Persistence backend.
    pub store: Option<StoreConfig>,

    /// Resolver cache sizing.
    pub cache: Option<CacheSection>,

    /// Console logging.
    pub logging: Option<LoggingConfig>,
}

impl RallyConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: RallyConfig) {
        self.session.merge(other.session);

        for (name, template) in other.templates {
            self.templates.insert(name, template);
        }

        if other.store.is_some() {
            self.store = other.store;
        }

        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Built-in defaults with the `[session]` section applied.
    pub fn session_defaults(&self) -> SessionParameters {
        SessionParameters::default().with_overrides(&self.session)
    }

    /// Look up a named template.
    pub fn template(&self, name: &str) -> crate::Result<&SessionOverrides> {
        self.templates
            .get(name)
            .ok_or_else(|| ConfigError::TemplateNotFound {
                name: name.to_string(),
                available: if self.templates.is_empty() {
                    "none".to_string()
                } else {
                    self.template_names().join(", ")
                },
            })
    }

    pub fn template_names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    /// Problems that don't prevent loading but will fail at use.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.session.capacity == Some(0) {
            warnings.push("[session] capacity must be at least 1".to_string());
        }
        for (name, template) in &self.templates {
            if template.capacity == Some(0) {
                warnings.push(format!("[templates.{name}] capacity must be at least 1"));
            }
        }
        if let Some(cache) = &self.cache
            && cache.max_sessions == 0
        {
            warnings.push("[cache] max_sessions of 0 is treated as 1".to_string());
        }

        warnings
    }

    /// Console log level from `[logging]`, if set.
    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl ConfigProvider for RallyConfig {}

impl HasCacheConfig for RallyConfig {
    fn max_cached_sessions(&self) -> usize {
        self.cache
            .as_ref()
            .map(|c| c.max_sessions)
            .unwrap_or(config_defaults::MAX_CACHED_SESSIONS)
    }
}

impl HasStoreConfig for RallyConfig {
    fn store_kind(&self) -> StoreKind {
        self.store.as_ref().map(|s| s.backend).unwrap_or_default()
    }

    fn store_path(&self) -> PathBuf {
        self.store
            .as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| crate::default_data_dir().join(config_defaults::STORE_FILE))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Persistence backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StoreKind,

    /// JSON document path for the file backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Resolver cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Session views kept per resolver.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_max_sessions() -> usize {
    config_defaults::MAX_CACHED_SESSIONS
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Console filter directive for rally crates (e.g. `debug`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling JSON log. Defaults to `<config dir>/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}
