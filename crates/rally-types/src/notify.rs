//! The notifier contract.
//!
//! This is the only way the core talks to users. The chat-platform layer
//! implements it; tests implement it with a recorder. Every method is a
//! suspension point, so callers await them one at a time in the order the
//! notifications should arrive.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ids::{ServerId, SessionId, UserId};

/// Emoji the announcement is seeded with; reacting with it joins the session.
pub const JOIN_EMOJI: &str = "✅";

/// Failure reported by the notifier collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    /// The announcement post no longer exists (deleted out-of-band).
    #[error("announcement not found: {0}")]
    NotFound(String),

    /// The platform rejected or failed to deliver the request.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for notifier calls.
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// User-facing side effects of session transitions.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a direct message to a user.
    async fn send_direct(&self, user_id: &UserId, text: &str) -> NotifyResult<()>;

    /// Post a new announcement in a server.
    ///
    /// The id of the posted announcement becomes the new session's id.
    async fn post_announcement(&self, server_id: &ServerId, content: &str)
    -> NotifyResult<SessionId>;

    /// Replace the content of a session's announcement.
    async fn edit_announcement(&self, session_id: &SessionId, content: &str) -> NotifyResult<()>;

    /// Remove a session's announcement.
    async fn delete_announcement(&self, session_id: &SessionId) -> NotifyResult<()>;

    /// Add a reaction to a session's announcement.
    async fn react_to_announcement(&self, session_id: &SessionId, emoji: &str)
    -> NotifyResult<()>;
}

/// Shared notifier type used across crates.
pub type SharedNotifier = Arc<dyn Notifier>;
