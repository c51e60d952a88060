//! Join and leave commands.

use anyhow::Result;
use clap::Args;
use rally_domain::{Admission, Removal, SessionId, UserId};
use serde_json::json;

use super::{Context, print_json};

/// Arguments for the join command.
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Session (announcement) id
    pub session: String,

    /// User joining
    pub user: String,
}

/// Arguments for the leave command.
#[derive(Args, Debug)]
pub struct LeaveArgs {
    /// Session (announcement) id
    pub session: String,

    /// User leaving
    pub user: String,
}

pub async fn join(args: JoinArgs, ctx: &Context) -> Result<()> {
    let (_registry, server) = ctx.server()?;
    let session_id = SessionId::from(args.session.as_str());
    let user_id = UserId::from(args.user.as_str());

    let admission = server.join_session(&session_id, &user_id).await?;

    if ctx.json_output {
        let value = match admission {
            Admission::Confirmed => json!({ "status": "confirmed" }),
            Admission::Waitlisted { position } => {
                json!({ "status": "waitlisted", "position": position })
            }
        };
        print_json(&value)?;
    } else {
        match admission {
            Admission::Confirmed => println!("{user_id} confirmed"),
            Admission::Waitlisted { position } => {
                println!("{user_id} waitlisted at position {position}")
            }
        }
    }
    Ok(())
}

pub async fn leave(args: LeaveArgs, ctx: &Context) -> Result<()> {
    let (_registry, server) = ctx.server()?;
    let session_id = SessionId::from(args.session.as_str());
    let user_id = UserId::from(args.user.as_str());

    let removal = server.leave_session(&session_id, &user_id).await?;

    let status = match removal {
        Removal::Confirmed => "removed",
        Removal::Waitlisted => "removed_from_waitlist",
        Removal::NotMember => "not_member",
    };
    if ctx.json_output {
        print_json(&json!({ "status": status }))?;
    } else {
        match removal {
            Removal::Confirmed => println!("{user_id} left the session"),
            Removal::Waitlisted => println!("{user_id} left the waitlist"),
            Removal::NotMember => println!("{user_id} was not in the session"),
        }
    }
    Ok(())
}
