//! Orchestration of external lifecycle events for one server.
//!
//! [`Server`] maps requests (create, start, close, capacity, broadcast) and
//! membership events (reaction added or removed) onto [`Session`] and
//! [`User`] operations. Errors propagate untouched to the caller, which
//! decides how to present them.

use std::sync::Arc;

use rally_types::{JOIN_EMOJI, ServerId, SessionId, SessionOverrides, SessionParameters, UserId};
use tracing::{debug, info, warn};

use crate::announcement;
use crate::resolver::Resolver;
use crate::session::{Admission, Removal, Session};
use crate::user::User;
use crate::{DomainError, Result};

/// Session lifecycle entry point for one server.
#[derive(Debug, Clone)]
pub struct Server {
    resolver: Arc<Resolver>,
    defaults: SessionParameters,
}

impl Server {
    pub fn new(resolver: Arc<Resolver>, defaults: SessionParameters) -> Self {
        Self { resolver, defaults }
    }

    pub fn id(&self) -> &ServerId {
        self.resolver.server_id()
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    pub fn defaults(&self) -> &SessionParameters {
        &self.defaults
    }

    // ── Creation ────────────────────────────────────────────────────────

    /// Create a session owned by `owner_id` and admit the owner.
    ///
    /// An active session the owner already has is cancelled first, and that
    /// close completes before the new announcement is posted.
    pub async fn create_session(
        &self,
        owner_id: &UserId,
        overrides: Option<&SessionOverrides>,
    ) -> Result<Session> {
        let owner = self.resolver.resolve_user(owner_id)?;
        if let Some(previous) = self.get_session_from_user(&owner).await?
            && previous.is_owned_by(owner_id)
        {
            info!(
                owner_id = %owner_id,
                session_id = %previous.id(),
                "Closing previous session before creating a new one"
            );
            previous.terminate(false).await?;
        }

        // Re-read: terminate rewrote the owner's record.
        let owner = self.resolver.resolve_user(owner_id)?;
        owner.clear_created_session()?;

        let session = self.open_session(Some(owner_id), overrides).await?;
        owner.set_created_session(&session.id())?;
        session.add_player(owner_id).await?;
        Ok(session)
    }

    /// Create an unowned session, as a scheduled trigger would.
    pub async fn create_system_session(
        &self,
        overrides: Option<&SessionOverrides>,
    ) -> Result<Session> {
        self.open_session(None, overrides).await
    }

    async fn open_session(
        &self,
        owner_id: Option<&UserId>,
        overrides: Option<&SessionOverrides>,
    ) -> Result<Session> {
        let mut parameters = self.defaults.clone();
        if let Some(overrides) = overrides {
            parameters.apply(overrides);
        }
        if parameters.capacity < 1 {
            return Err(DomainError::InvalidCapacity {
                requested: parameters.capacity,
                confirmed: 0,
            });
        }

        let mut preview = rally_store::SessionRecord::new(
            self.id().clone(),
            SessionId::from(""),
            owner_id.cloned(),
            parameters.clone(),
        );
        if let Some(owner_id) = owner_id {
            preview.confirmed.push(owner_id.clone());
        }

        let notifier = self.resolver.notifier();
        let session_id = notifier
            .post_announcement(self.id(), &announcement::render(&preview))
            .await?;

        let view = self.resolver.driver().create_session(
            self.id(),
            &session_id,
            owner_id,
            &parameters,
            None,
        )?;
        let session = self.resolver.register_session(view).await;
        info!(
            server_id = %self.id(),
            session_id = %session_id,
            owner_id = ?owner_id,
            capacity = parameters.capacity,
            "Session created"
        );

        if let Err(e) = notifier.react_to_announcement(&session_id, JOIN_EMOJI).await {
            warn!(session_id = %session_id, error = %e, "Failed to seed join reaction");
        }
        Ok(session)
    }

    // ── Start / close ───────────────────────────────────────────────────

    /// Start the session `owner_id` currently owns.
    pub async fn start_session_owned_by_user(&self, owner_id: &UserId) -> Result<bool> {
        let session = self.owned_session(owner_id).await?;
        session.terminate(true).await
    }

    /// Cancel the session `owner_id` currently owns.
    pub async fn close_session_owned_by_user(&self, owner_id: &UserId) -> Result<bool> {
        let session = self.owned_session(owner_id).await?;
        session.terminate(false).await
    }

    /// Start a session by id, without an ownership check.
    pub async fn start_session(&self, session_id: &SessionId) -> Result<bool> {
        self.resolver
            .resolve_session(session_id)
            .await?
            .terminate(true)
            .await
    }

    /// Cancel a session by id, without an ownership check.
    pub async fn close_session(&self, session_id: &SessionId) -> Result<bool> {
        self.resolver
            .resolve_session(session_id)
            .await?
            .terminate(false)
            .await
    }

    // ── Membership ──────────────────────────────────────────────────────

    /// A join reaction was added to an announcement.
    pub async fn join_session(&self, session_id: &SessionId, user_id: &UserId) -> Result<Admission> {
        self.resolver
            .resolve_session(session_id)
            .await?
            .add_player(user_id)
            .await
    }

    /// A join reaction was removed from an announcement.
    pub async fn leave_session(&self, session_id: &SessionId, user_id: &UserId) -> Result<Removal> {
        self.resolver
            .resolve_session(session_id)
            .await?
            .remove_player(user_id)
            .await
    }

    /// Resize the session `owner_id` owns. Returns the promoted users.
    pub async fn set_session_capacity(
        &self,
        owner_id: &UserId,
        capacity: usize,
    ) -> Result<Vec<UserId>> {
        self.owned_session(owner_id)
            .await?
            .set_capacity(capacity)
            .await
    }

    /// Message the members of the session `owner_id` owns.
    pub async fn broadcast_from_owner(
        &self,
        owner_id: &UserId,
        text: &str,
        include_waitlist: bool,
    ) -> Result<usize> {
        self.owned_session(owner_id)
            .await?
            .broadcast(text, include_waitlist)
            .await
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    /// The session `user` owns, or `None` if it has none or it is gone.
    pub async fn get_session_from_user(&self, user: &User) -> Result<Option<Session>> {
        let Some(session_id) = user.created_session_id() else {
            return Ok(None);
        };
        let found = self.resolver.find_session(&session_id).await?;
        if found.is_none() {
            debug!(user_id = %user.id(), session_id = %session_id, "Owned session no longer exists");
        }
        Ok(found)
    }

    /// The session an announcement belongs to, if any.
    pub async fn get_session_from_announcement_message(
        &self,
        announcement_id: &SessionId,
    ) -> Result<Option<Session>> {
        self.resolver.find_session(announcement_id).await
    }

    /// Resolve the owner's active session, checking both sides of the link.
    async fn owned_session(&self, owner_id: &UserId) -> Result<Session> {
        let owner = self.resolver.resolve_user(owner_id)?;
        let session_id = owner
            .created_session_id()
            .ok_or_else(|| DomainError::NoActiveSession(owner_id.clone()))?;

        let session = match self.resolver.resolve_session(&session_id).await {
            Ok(session) => session,
            Err(DomainError::SessionNotFound(_)) => {
                owner.clear_created_session()?;
                return Err(DomainError::NoActiveSession(owner_id.clone()));
            }
            Err(e) => return Err(e),
        };

        if !session.is_owned_by(owner_id) {
            return Err(DomainError::OwnershipMismatch {
                user_id: owner_id.clone(),
                session_id,
            });
        }
        Ok(session)
    }
}
