//! Reconcile command - bring stored state back in line with announcements.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{Context, print_json};

/// Arguments for the reconcile command.
#[derive(Args, Debug)]
pub struct ReconcileArgs {}

pub async fn run(_args: ReconcileArgs, ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    let report = registry.reconcile().await?;
    registry.shutdown();

    if ctx.json_output {
        return print_json(&json!({
            "sessionsChecked": report.sessions_checked,
            "sessionsDropped": report.sessions_dropped,
            "usersRepaired": report.users_repaired,
            "usersDeleted": report.users_deleted,
        }));
    }

    println!("Checked {} session(s)", report.sessions_checked);
    println!("  dropped:        {}", report.sessions_dropped);
    println!("  users repaired: {}", report.users_repaired);
    println!("  users deleted:  {}", report.users_deleted);
    Ok(())
}
