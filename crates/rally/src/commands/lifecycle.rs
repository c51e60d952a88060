//! Session lifecycle commands: create, capacity, start/close, broadcast.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Args};
use rally_domain::{SessionOverrides, UserId};
use serde_json::json;

use super::{Context, print_json};

/// Arguments for the create command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// User creating (and owning) the session
    #[arg(long)]
    pub owner: String,

    /// Named template from the `[templates]` config section
    #[arg(short, long)]
    pub template: Option<String>,

    /// Session name
    #[arg(long)]
    pub name: Option<String>,

    /// Maximum number of confirmed members
    #[arg(short, long)]
    pub capacity: Option<usize>,

    #[arg(long)]
    pub description: Option<String>,

    /// Start automatically once every seat is taken
    #[arg(long)]
    pub fire_when_full: bool,

    /// Link sent to confirmed members when the session starts
    #[arg(long)]
    pub url: Option<String>,

    /// Scheduled time (RFC 3339)
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,
}

impl CreateArgs {
    /// Template overrides with the per-command flags layered on top.
    fn overrides(&self, ctx: &Context) -> Result<SessionOverrides> {
        let mut overrides = match &self.template {
            Some(name) => ctx.config().template(name)?.clone(),
            None => SessionOverrides::new(),
        };

        let mut flags = SessionOverrides::new();
        flags.name = self.name.clone();
        flags.capacity = self.capacity;
        flags.description = self.description.clone();
        flags.url = self.url.clone();
        flags.date = self.date;
        if self.fire_when_full {
            flags.fire_when_full = Some(true);
        }
        overrides.merge(flags);
        Ok(overrides)
    }
}

/// Arguments for the capacity command.
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// Owner of the session to resize
    #[arg(long)]
    pub owner: String,

    /// New capacity
    pub capacity: usize,
}

/// Arguments for the start and close commands.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["owner", "session"])))]
pub struct TerminateArgs {
    /// Act on the session this user owns
    #[arg(long)]
    pub owner: Option<String>,

    /// Act on a session by id, without an ownership check
    #[arg(long)]
    pub session: Option<String>,
}

/// Arguments for the broadcast command.
#[derive(Args, Debug)]
pub struct BroadcastArgs {
    /// Owner of the session to message
    #[arg(long)]
    pub owner: String,

    /// Also message waitlisted members
    #[arg(long)]
    pub include_waitlist: bool,

    /// Message text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

pub async fn create(args: CreateArgs, ctx: &Context) -> Result<()> {
    let overrides = args.overrides(ctx)?;
    let (_registry, server) = ctx.server()?;
    let owner = UserId::from(args.owner.as_str());

    let session = server.create_session(&owner, Some(&overrides)).await?;

    if ctx.json_output {
        print_json(&session.snapshot())?;
    } else {
        println!("Created session {} ({})", session.id(), session.name());
    }
    Ok(())
}

pub async fn capacity(args: CapacityArgs, ctx: &Context) -> Result<()> {
    let (_registry, server) = ctx.server()?;
    let owner = UserId::from(args.owner.as_str());

    let promoted = server.set_session_capacity(&owner, args.capacity).await?;

    if ctx.json_output {
        print_json(&json!({ "capacity": args.capacity, "promoted": promoted }))?;
    } else {
        println!("Capacity set to {}", args.capacity);
        for user in &promoted {
            println!("  promoted {user}");
        }
    }
    Ok(())
}

pub async fn terminate(args: TerminateArgs, started: bool, ctx: &Context) -> Result<()> {
    let (_registry, server) = ctx.server()?;

    let closed = match (&args.owner, &args.session) {
        (Some(owner), _) if started => {
            server
                .start_session_owned_by_user(&owner.as_str().into())
                .await?
        }
        (Some(owner), _) => {
            server
                .close_session_owned_by_user(&owner.as_str().into())
                .await?
        }
        (None, Some(id)) if started => server.start_session(&id.as_str().into()).await?,
        (None, Some(id)) => server.close_session(&id.as_str().into()).await?,
        (None, None) => anyhow::bail!("either --owner or --session is required"),
    };

    let verb = if started { "started" } else { "cancelled" };
    if ctx.json_output {
        print_json(&json!({ "terminated": closed, "started": started }))?;
    } else if closed {
        println!("Session {verb}");
    } else {
        println!("Session was already closed");
    }
    Ok(())
}

pub async fn broadcast(args: BroadcastArgs, ctx: &Context) -> Result<()> {
    let (_registry, server) = ctx.server()?;
    let owner = UserId::from(args.owner.as_str());
    let text = args.text.join(" ");

    let sent = server
        .broadcast_from_owner(&owner, &text, args.include_waitlist)
        .await?;

    if ctx.json_output {
        print_json(&json!({ "sent": sent }))?;
    } else {
        println!("Message sent to {sent} member(s)");
    }
    Ok(())
}
