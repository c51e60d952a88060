//! CLI command handlers.

pub mod config;
pub mod lifecycle;
pub mod membership;
pub mod reconcile;
pub mod sessions;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rally_config::{LoadedConfig, RallyConfig, StoreConfig};
use rally_domain::{Driver, ResolverRegistry, Server, ServerId};
use rally_types::StoreKind;

use crate::notifier::ConsoleNotifier;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Layered configuration, with CLI store overrides applied.
    pub loaded: LoadedConfig,
    /// Server the command applies to.
    pub server_id: ServerId,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn new(
        mut loaded: LoadedConfig,
        server_id: ServerId,
        store: Option<StoreKind>,
        data_file: Option<PathBuf>,
        json_output: bool,
        verbose: bool,
    ) -> Self {
        apply_store_overrides(&mut loaded.config, store, data_file);
        Self {
            loaded,
            server_id,
            json_output,
            verbose,
        }
    }

    pub fn config(&self) -> &RallyConfig {
        &self.loaded.config
    }

    /// Open the configured store and build a registry over it.
    pub fn registry(&self) -> Result<ResolverRegistry> {
        let config = self.config();
        let driver = Driver::from_config(config)?;
        let notifier = Arc::new(ConsoleNotifier::new(self.json_output));
        Ok(ResolverRegistry::from_config(driver, notifier, config)
            .with_defaults(config.session_defaults()))
    }

    /// The orchestrator for this command's server.
    pub fn server(&self) -> Result<(ResolverRegistry, Server)> {
        let registry = self.registry()?;
        let server = registry.server(&self.server_id);
        Ok((registry, server))
    }
}

/// `--store` replaces the backend; `--data-file` implies the file backend
/// unless `--store` says otherwise.
fn apply_store_overrides(
    config: &mut RallyConfig,
    store: Option<StoreKind>,
    data_file: Option<PathBuf>,
) {
    if store.is_none() && data_file.is_none() {
        return;
    }
    let section = config.store.get_or_insert_with(StoreConfig::default);
    if let Some(path) = data_file {
        section.path = Some(path);
        section.backend = StoreKind::File;
    }
    if let Some(kind) = store {
        section.backend = kind;
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
