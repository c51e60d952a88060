//! Finding the config layers on disk and folding them together.
//!
//! Two files are consulted, the second overriding the first:
//! `<config dir>/config.toml` for the user and `rally.toml` in the working
//! (or given) directory for the project. CLI flags are applied by the
//! binary afterwards. A layer that is missing is skipped; one that can't
//! be read or parsed is skipped with a warning, so a broken project file
//! never stops `rally` from starting.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, RallyConfig, Result};

const CONFIG_DIR_ENV: &str = "RALLY_CONFIG_DIR";
const APP_DIR: &str = "rally";
const USER_FILE: &str = "config.toml";
const PROJECT_FILE: &str = "rally.toml";

/// Which layer a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Project => "project",
        })
    }
}

/// One file that was looked for.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    pub path: PathBuf,
    /// Found, parsed and merged.
    pub loaded: bool,
}

/// The merged config plus what went into it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RallyConfig,
    /// In merge order, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Skipped layers and [`RallyConfig::validate`] findings.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Where each layer lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// `None` when no config directory can be determined.
    pub user: Option<PathBuf>,
    pub project: PathBuf,
}

impl ConfigPaths {
    /// Standard locations, with the project file under `project_dir`
    /// (the working directory if `None`).
    pub fn discover(project_dir: Option<&Path>) -> Self {
        Self {
            user: user_config_path(),
            project: project_dir.unwrap_or(Path::new(".")).join(PROJECT_FILE),
        }
    }

    /// Look for the user file in `dir` instead.
    pub fn with_user_dir(mut self, dir: &Path) -> Self {
        self.user = Some(dir.join(USER_FILE));
        self
    }

    pub fn load(&self) -> LoadedConfig {
        let mut loaded = LoadedConfig {
            config: RallyConfig::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        };

        let layers = self
            .user
            .iter()
            .map(|p| (Layer::User, p))
            .chain([(Layer::Project, &self.project)]);
        for (layer, path) in layers {
            let found = path.is_file();
            let merged = found && merge_file(&mut loaded, layer, path);
            loaded.sources.push(ConfigSource {
                layer,
                path: path.clone(),
                loaded: merged,
            });
        }

        let problems = loaded.config.validate();
        loaded.warnings.extend(problems);
        loaded
    }
}

/// Merge one file into `loaded`, recording a warning on failure.
fn merge_file(loaded: &mut LoadedConfig, layer: Layer, path: &Path) -> bool {
    match read_config(path) {
        Ok(config) => {
            loaded.config.merge(config);
            true
        }
        Err(e) => {
            loaded
                .warnings
                .push(format!("Ignoring {layer} config {}: {e}", path.display()));
            false
        }
    }
}

/// Merge the user and project layers from their standard locations.
pub fn load_config(project_dir: Option<&Path>) -> LoadedConfig {
    ConfigPaths::discover(project_dir).load()
}

/// Parse a single file, without layering.
pub fn read_config(path: &Path) -> Result<RallyConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    RallyConfig::from_toml(&contents)
}

/// `$RALLY_CONFIG_DIR` if set and non-empty, else `<platform config>/rally`.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_DIR)),
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_FILE))
}

/// Directory holding the default store document.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}
