use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `--template` named a preset the config doesn't define.
    #[error("session template '{name}' not found (available: {available})")]
    TemplateNotFound { name: String, available: String },
}
