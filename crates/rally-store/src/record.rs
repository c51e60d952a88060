use std::collections::BTreeSet;

use rally_types::{ServerId, SessionId, SessionParameters, UserId};
use serde::{Deserialize, Serialize};

/// A persisted session.
///
/// `confirmed` is in confirmation order; `waitlisted` is FIFO. A user id is
/// in at most one of them, and the two never hold duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub server_id: ServerId,
    pub session_id: SessionId,
    /// Unset for system-created sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub confirmed: Vec<UserId>,
    #[serde(default)]
    pub waitlisted: Vec<UserId>,
    pub parameters: SessionParameters,
    #[serde(default)]
    pub closed: bool,
}

impl SessionRecord {
    pub fn new(
        server_id: ServerId,
        session_id: SessionId,
        owner_id: Option<UserId>,
        parameters: SessionParameters,
    ) -> Self {
        Self {
            server_id,
            session_id,
            owner_id,
            confirmed: Vec::new(),
            waitlisted: Vec::new(),
            parameters,
            closed: false,
        }
    }

    pub fn is_confirmed(&self, user_id: &UserId) -> bool {
        self.confirmed.contains(user_id)
    }

    pub fn is_waitlisted(&self, user_id: &UserId) -> bool {
        self.waitlisted.contains(user_id)
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.is_confirmed(user_id) || self.is_waitlisted(user_id)
    }

    pub fn is_full(&self) -> bool {
        self.confirmed.len() >= self.parameters.capacity
    }

    pub(crate) fn matches(&self, server_id: &ServerId, session_id: &SessionId) -> bool {
        &self.server_id == server_id && &self.session_id == session_id
    }
}

/// A persisted user, scoped to one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub server_id: ServerId,
    pub user_id: UserId,
    #[serde(default)]
    pub joined_session_ids: BTreeSet<SessionId>,
    #[serde(default)]
    pub waitlisted_session_ids: BTreeSet<SessionId>,
    /// The session this user currently owns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_session_id: Option<SessionId>,
}

impl UserRecord {
    pub fn new(server_id: ServerId, user_id: UserId) -> Self {
        Self {
            server_id,
            user_id,
            joined_session_ids: BTreeSet::new(),
            waitlisted_session_ids: BTreeSet::new(),
            created_session_id: None,
        }
    }

    /// True when the record references no session at all.
    pub fn is_idle(&self) -> bool {
        self.joined_session_ids.is_empty()
            && self.waitlisted_session_ids.is_empty()
            && self.created_session_id.is_none()
    }

    pub(crate) fn matches(&self, server_id: &ServerId, user_id: &UserId) -> bool {
        &self.server_id == server_id && &self.user_id == user_id
    }
}
