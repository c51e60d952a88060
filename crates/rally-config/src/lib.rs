//! Configuration system for Rally.
//!
//! Provides TOML-based configuration with:
//! - Session defaults (`[session]`, `[session.messages]`)
//! - Named session templates (`[templates.raid]`, `[templates.quick]`, ...)
//! - Store backend selection (`[store]`) and cache sizing (`[cache]`)
//! - Config file layering (user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigPaths, ConfigSource, Layer, LoadedConfig, config_dir, default_data_dir, load_config,
    read_config, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
