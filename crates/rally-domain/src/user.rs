//! Domain user: membership bookkeeping over one [`UserView`].

use rally_store::UserView;
use rally_types::{ServerId, SessionId, UserId};

use crate::Result;

/// A member of a server, as seen by the session lifecycle.
///
/// Holds only its own view; sessions are referenced by id and resolved
/// through the [`Resolver`](crate::Resolver) when needed.
#[derive(Debug, Clone)]
pub struct User {
    view: UserView,
}

impl User {
    pub fn new(view: UserView) -> Self {
        Self { view }
    }

    pub fn id(&self) -> UserId {
        self.view.user_id()
    }

    pub fn server_id(&self) -> ServerId {
        self.view.server_id()
    }

    /// The session this user currently owns.
    pub fn created_session_id(&self) -> Option<SessionId> {
        self.view.created_session_id()
    }

    pub fn has_active_session(&self) -> bool {
        self.view.created_session_id().is_some()
    }

    pub fn joined_sessions(&self) -> Vec<SessionId> {
        self.view.joined_session_ids()
    }

    pub fn waitlisted_sessions(&self) -> Vec<SessionId> {
        self.view.waitlisted_session_ids()
    }

    /// Whether the user references the session in any role.
    pub fn references(&self, session_id: &SessionId) -> bool {
        self.created_session_id().as_ref() == Some(session_id)
            || self.joined_sessions().contains(session_id)
            || self.waitlisted_sessions().contains(session_id)
    }

    /// No memberships and no owned session.
    pub fn is_idle(&self) -> bool {
        self.view.is_idle()
    }

    pub fn mark_joined(&self, session_id: &SessionId) -> Result<()> {
        Ok(self.view.add_joined(session_id)?)
    }

    pub fn mark_waitlisted(&self, session_id: &SessionId) -> Result<()> {
        Ok(self.view.add_waitlisted(session_id)?)
    }

    /// Drop every reference to the session, ownership included.
    pub fn forget_session(&self, session_id: &SessionId) -> Result<bool> {
        Ok(self.view.forget_session(session_id)?)
    }

    pub fn set_created_session(&self, session_id: &SessionId) -> Result<()> {
        Ok(self.view.set_created_session(Some(session_id.clone()))?)
    }

    pub fn clear_created_session(&self) -> Result<()> {
        Ok(self.view.set_created_session(None)?)
    }

    pub fn view(&self) -> &UserView {
        &self.view
    }
}
