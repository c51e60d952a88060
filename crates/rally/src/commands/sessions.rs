//! Sessions command - inspect stored sessions.

use anyhow::Result;
use clap::{Args, Subcommand};
use rally_domain::{SessionRecord, UserId};

use super::{Context, print_json};

/// Arguments for the sessions command.
#[derive(Args, Debug)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// List the open sessions on this server
    List,

    /// Show one session's roster and parameters
    Show {
        /// Session (announcement) id
        id: String,
    },
}

pub async fn run(args: SessionsArgs, ctx: &Context) -> Result<()> {
    match args.command {
        SessionsCommand::List => cmd_list(ctx),
        SessionsCommand::Show { id } => cmd_show(&id, ctx),
    }
}

fn server_sessions(ctx: &Context) -> Result<Vec<SessionRecord>> {
    let registry = ctx.registry()?;
    Ok(registry
        .driver()
        .get_all_sessions()?
        .into_iter()
        .filter(|view| view.server_id() == ctx.server_id)
        .map(|view| view.snapshot())
        .collect())
}

fn cmd_list(ctx: &Context) -> Result<()> {
    let sessions = server_sessions(ctx)?;

    if ctx.json_output {
        return print_json(&sessions);
    }

    if sessions.is_empty() {
        println!("No sessions on server {}", ctx.server_id);
        return Ok(());
    }

    println!(
        "{:<38} {:<20} {:>9} {:>8}  OWNER",
        "ID", "NAME", "CONFIRMED", "WAITLIST"
    );
    for record in &sessions {
        println!(
            "{:<38} {:<20} {:>9} {:>8}  {}",
            record.session_id,
            truncate(&record.parameters.name, 20),
            format!("{}/{}", record.confirmed.len(), record.parameters.capacity),
            record.waitlisted.len(),
            record
                .owner_id
                .as_ref()
                .map(UserId::to_string)
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn cmd_show(id: &str, ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    let view = registry.driver().get_session_view(&ctx.server_id, &id.into())?;
    let record = view.snapshot();

    if ctx.json_output {
        return print_json(&record);
    }

    let params = &record.parameters;
    println!("{}", params.name);
    println!("  id:        {}", record.session_id);
    if let Some(owner) = &record.owner_id {
        println!("  owner:     {owner}");
    }
    if !params.description.is_empty() {
        println!("  about:     {}", params.description);
    }
    if let Some(date) = params.date {
        println!("  when:      {}", date.format("%Y-%m-%d %H:%M UTC"));
    }
    println!(
        "  capacity:  {}{}",
        params.capacity,
        if params.fire_when_full {
            " (starts when full)"
        } else {
            ""
        }
    );
    println!("  confirmed: {}", join_ids(&record.confirmed));
    println!("  waitlist:  {}", join_ids(&record.waitlisted));
    Ok(())
}

fn join_ids(ids: &[UserId]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(UserId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Raid", 20), "Raid");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[]), "none");
        assert_eq!(join_ids(&["a".into(), "b".into()]), "a, b");
    }
}
