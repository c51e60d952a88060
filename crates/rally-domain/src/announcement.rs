//! Announcement post content.
//!
//! The announcement is the public face of a session: its id is the session
//! id, its content lists the roster, and reacting to it joins the session.

use rally_store::SessionRecord;
use rally_types::{JOIN_EMOJI, UserId};

/// Content of an open session's announcement.
pub fn render(record: &SessionRecord) -> String {
    let params = &record.parameters;
    let mut lines = vec![format!("**{}**", params.name)];

    if !params.description.is_empty() {
        lines.push(params.description.clone());
    }
    if let Some(date) = params.date {
        lines.push(format!("When: {}", date.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(owner) = &record.owner_id {
        lines.push(format!("Host: {}", mention(owner)));
    }

    lines.push(format!(
        "Confirmed ({}/{}): {}",
        record.confirmed.len(),
        params.capacity,
        roster(&record.confirmed)
    ));
    if !record.waitlisted.is_empty() {
        lines.push(format!(
            "Waitlist ({}): {}",
            record.waitlisted.len(),
            roster(&record.waitlisted)
        ));
    }
    if params.fire_when_full {
        lines.push("Starts automatically when full.".to_string());
    }
    lines.push(format!("React with {JOIN_EMOJI} to join."));
    lines.join("\n")
}

/// Content the announcement is edited into once the session has started.
pub fn render_started(record: &SessionRecord) -> String {
    format!(
        "**{}** has started.\nPlayers: {}",
        record.parameters.name,
        roster(&record.confirmed)
    )
}

pub fn mention(user_id: &UserId) -> String {
    format!("<@{user_id}>")
}

fn roster(users: &[UserId]) -> String {
    if users.is_empty() {
        return "none".to_string();
    }
    users.iter().map(mention).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use rally_types::SessionParameters;

    use super::*;

    fn record() -> SessionRecord {
        let params = SessionParameters {
            name: "Raid".to_string(),
            capacity: 2,
            description: "Bring snacks".to_string(),
            ..Default::default()
        };
        SessionRecord::new("g1".into(), "s1".into(), Some("owner".into()), params)
    }

    #[test]
    fn test_render_open_session() {
        let mut rec = record();
        rec.confirmed = vec!["owner".into(), "a".into()];
        rec.waitlisted = vec!["b".into()];

        let content = render(&rec);
        assert!(content.starts_with("**Raid**\nBring snacks"));
        assert!(content.contains("Host: <@owner>"));
        assert!(content.contains("Confirmed (2/2): <@owner>, <@a>"));
        assert!(content.contains("Waitlist (1): <@b>"));
        assert!(content.ends_with("React with ✅ to join."));
    }

    #[test]
    fn test_render_empty_roster() {
        let content = render(&record());
        assert!(content.contains("Confirmed (0/2): none"));
        assert!(!content.contains("Waitlist"));
    }

    #[test]
    fn test_render_started() {
        let mut rec = record();
        rec.confirmed = vec!["a".into()];
        assert_eq!(render_started(&rec), "**Raid** has started.\nPlayers: <@a>");
    }
}
