//! Rally - capacity-bounded session scheduling with waitlists
//!
//! Main entry point for the Rally CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rally_types::StoreKind;

mod commands;
mod notifier;

use commands::{config, lifecycle, membership, reconcile, sessions};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Rally - capacity-bounded session scheduling with waitlists
#[derive(Parser)]
#[command(name = "rally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server (scheduling domain) the command applies to
    #[arg(long, global = true, env = "RALLY_SERVER", default_value = "default")]
    pub server: String,

    /// Storage backend: memory or file
    #[arg(long, global = true)]
    pub store: Option<StoreKind>,

    /// JSON document used by the file backend
    #[arg(long, global = true, env = "RALLY_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a session owned by a user
    Create(lifecycle::CreateArgs),

    /// Add a user to a session
    Join(membership::JoinArgs),

    /// Remove a user from a session
    Leave(membership::LeaveArgs),

    /// Change the capacity of an owner's session
    Capacity(lifecycle::CapacityArgs),

    /// Start a session, notifying every member
    Start(lifecycle::TerminateArgs),

    /// Cancel a session, notifying every member
    Close(lifecycle::TerminateArgs),

    /// Message the members of an owner's session
    Broadcast(lifecycle::BroadcastArgs),

    /// Inspect stored sessions
    Sessions(sessions::SessionsArgs),

    /// Drop stale sessions and dangling user references
    Reconcile(reconcile::ReconcileArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = rally_config::load_config(None);

    // Initialize tracing: console (stderr) + rotating JSON file
    let filter = if cli.verbose {
        "rally=debug,rally_domain=debug,rally_store=debug,rally_cache=debug,rally_config=debug,warn"
            .to_string()
    } else if let Some(level) = loaded.config.log_level() {
        format!(
            "rally={level},rally_domain={level},rally_store={level},rally_cache={level},rally_config={level},warn"
        )
    } else {
        "rally=warn,rally_domain=warn,rally_store=warn,rally_cache=warn,warn".to_string()
    };

    let log_dir = loaded
        .config
        .logging
        .as_ref()
        .and_then(|l| l.dir.clone())
        .or_else(|| rally_config::config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "rally.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "rally=trace,rally_domain=trace,rally_store=trace,rally_cache=trace,rally_config=trace,info",
                )),
        )
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    // Create context for commands
    let ctx = commands::Context::new(
        loaded,
        cli.server.into(),
        cli.store,
        cli.data_file,
        cli.json,
        cli.verbose,
    );

    // Dispatch to command handlers
    match cli.command {
        Commands::Create(args) => lifecycle::create(args, &ctx).await,
        Commands::Join(args) => membership::join(args, &ctx).await,
        Commands::Leave(args) => membership::leave(args, &ctx).await,
        Commands::Capacity(args) => lifecycle::capacity(args, &ctx).await,
        Commands::Start(args) => lifecycle::terminate(args, true, &ctx).await,
        Commands::Close(args) => lifecycle::terminate(args, false, &ctx).await,
        Commands::Broadcast(args) => lifecycle::broadcast(args, &ctx).await,
        Commands::Sessions(args) => sessions::run(args, &ctx).await,
        Commands::Reconcile(args) => reconcile::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
