//! Notifier that prints to the terminal.
//!
//! Stands in for a chat platform: direct messages and announcement changes
//! are written to stdout, and each posted announcement gets a fresh UUID.

use async_trait::async_trait;
use rally_types::{Notifier, NotifyResult, ServerId, SessionId, UserId};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    /// Suppress output (JSON mode prints only the command result).
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn print(&self, line: String) {
        if !self.quiet {
            println!("{line}");
        }
    }
}

fn indent(content: &str) -> String {
    content.replace('\n', "\n    ")
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_direct(&self, user_id: &UserId, text: &str) -> NotifyResult<()> {
        self.print(format!("[dm {user_id}] {}", indent(text)));
        Ok(())
    }

    async fn post_announcement(
        &self,
        server_id: &ServerId,
        content: &str,
    ) -> NotifyResult<SessionId> {
        let id = SessionId::new(Uuid::new_v4().to_string());
        self.print(format!("[post {id} in {server_id}]\n    {}", indent(content)));
        Ok(id)
    }

    async fn edit_announcement(&self, session_id: &SessionId, content: &str) -> NotifyResult<()> {
        self.print(format!("[edit {session_id}]\n    {}", indent(content)));
        Ok(())
    }

    async fn delete_announcement(&self, session_id: &SessionId) -> NotifyResult<()> {
        self.print(format!("[delete {session_id}]"));
        Ok(())
    }

    async fn react_to_announcement(&self, session_id: &SessionId, emoji: &str) -> NotifyResult<()> {
        self.print(format!("[react {session_id}] {emoji}"));
        Ok(())
    }
}
