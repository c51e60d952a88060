//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use rally_types::{HasCacheConfig, HasStoreConfig};

use super::{Context, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration, session defaults and templates
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./rally.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = ctx.config();

    if ctx.json_output {
        return print_json(config);
    }

    println!("# Rally Configuration\n");

    let sources = ctx.loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let defaults = config.session_defaults();
    println!("Session defaults:");
    println!("  name:           {}", defaults.name);
    println!("  capacity:       {}", defaults.capacity);
    println!("  fire_when_full: {}", defaults.fire_when_full);
    if let Some(url) = &defaults.url {
        println!("  url:            {url}");
    }
    println!();

    if config.templates.is_empty() {
        println!("No templates configured\n");
    } else {
        println!("Templates:");
        for (name, template) in &config.templates {
            let params = defaults.clone().with_overrides(template);
            println!(
                "  {:<12} {} (capacity {}{})",
                name,
                params.name,
                params.capacity,
                if params.fire_when_full {
                    ", fires when full"
                } else {
                    ""
                }
            );
        }
        println!();
    }

    println!("Store:");
    println!("  backend: {}", config.store_kind().as_str());
    println!("  path:    {}", config.store_path().display());
    println!();

    println!("Cache:");
    println!("  max_sessions: {}", config.max_cached_sessions());
    println!();

    if !ctx.loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &ctx.loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else if source.path.is_file() {
            "✗ ignored"
        } else {
            "· not found"
        };
        println!("  {status:<12} {:<8} {}", source.layer, source.path.display());
    }

    println!();
    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'rally config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

const STARTER_CONFIG: &str = r#"# Rally Configuration

# Defaults for every new session
[session]
name = "Game Night"
capacity = 5
fire_when_full = false

# Notification text; {name}, {position}, {url} and {owner} are substituted
# [session.messages]
# confirmed = "You're in for {name}."
# waitlisted = "{name} is full. You're #{position} on the waitlist."

# Named templates (use with `rally create --template raid`)
# [templates.raid]
# name = "Raid Night"
# capacity = 8
# fire_when_full = true

# [store]
# backend = "file"
# path = "/var/lib/rally/rally.json"

# [cache]
# max_sessions = 5
"#;

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("rally.toml")
    } else {
        let dir = rally_config::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;
        dir.join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, STARTER_CONFIG)?;
    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  rally config show               # verify configuration");
    println!("  rally create --owner alice      # open a session");

    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = rally_config::user_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}
