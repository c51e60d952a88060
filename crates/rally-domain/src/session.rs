//! The session admission/waitlist state machine.
//!
//! A [`Session`] is Open until it is terminated, then Closed for good. Every
//! mutating operation holds the session's writer lock for its whole
//! duration, awaited notifications included, so concurrent admissions are
//! applied one at a time and can never push `confirmed` past capacity.
//!
//! Notifications go out in a fixed order within an operation: the direct
//! message to the affected user, then any promotions (front of the waitlist
//! first), then the announcement edit. Delivery failures are logged and do
//! not undo the transition, which has already been persisted.

use std::sync::Arc;

use rally_store::{SessionRecord, SessionView};
use rally_types::{
    MessageTemplates, ServerId, SessionId, SessionParameters, UserId, render_template,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::announcement;
use crate::resolver::Resolver;
use crate::{DomainError, Result};

/// Where `add_player` placed the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Confirmed,
    /// 1-based position in the waitlist.
    Waitlisted { position: usize },
}

/// What `remove_player` took the user out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Confirmed,
    Waitlisted,
    /// The user was not a member; nothing changed.
    NotMember,
}

/// A capacity-bounded group with confirmed and waitlisted members.
///
/// Constructed fresh on every resolve. Members are referenced by id and
/// resolved through the [`Resolver`] when their records need updating.
pub struct Session {
    view: SessionView,
    resolver: Arc<Resolver>,
    writer: Arc<Mutex<()>>,
}

impl Session {
    pub(crate) fn new(view: SessionView, resolver: Arc<Resolver>, writer: Arc<Mutex<()>>) -> Self {
        Self {
            view,
            resolver,
            writer,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.view.session_id()
    }

    pub fn server_id(&self) -> ServerId {
        self.view.server_id()
    }

    pub fn owner_id(&self) -> Option<UserId> {
        self.view.owner_id()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.view.owner_id().as_ref() == Some(user_id)
    }

    pub fn name(&self) -> String {
        self.view.parameters().name
    }

    pub fn capacity(&self) -> usize {
        self.view.capacity()
    }

    pub fn confirmed(&self) -> Vec<UserId> {
        self.view.confirmed()
    }

    pub fn waitlisted(&self) -> Vec<UserId> {
        self.view.waitlisted()
    }

    pub fn parameters(&self) -> SessionParameters {
        self.view.parameters()
    }

    pub fn is_closed(&self) -> bool {
        self.view.is_closed()
    }

    pub fn snapshot(&self) -> SessionRecord {
        self.view.snapshot()
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Admit a user: a seat if one is free, otherwise the waitlist tail.
    ///
    /// Taking the last seat of a `fire_when_full` session starts it.
    pub async fn add_player(&self, user_id: &UserId) -> Result<Admission> {
        let _guard = self.writer.lock().await;

        if self.view.is_member(user_id) {
            return Err(DomainError::AlreadyMember(user_id.clone()));
        }
        self.ensure_open()?;

        let session_id = self.id();
        let user = self.resolver.resolve_user(user_id)?;
        let messages = self.messages();

        let admission = if self.view.confirmed_len() < self.view.capacity() {
            self.view.add_to_confirmed(user_id)?;
            user.mark_joined(&session_id)?;
            self.notify(user_id, &messages.confirmed, None).await;
            Admission::Confirmed
        } else {
            let position = self.view.add_to_waitlist(user_id)?;
            user.mark_waitlisted(&session_id)?;
            let position_text = position.to_string();
            self.notify(user_id, &messages.waitlisted, Some(position_text.as_str()))
                .await;
            Admission::Waitlisted { position }
        };
        info!(session_id = %session_id, user_id = %user_id, ?admission, "Player added");

        self.refresh_announcement().await;
        self.fire_if_able_locked().await?;
        Ok(admission)
    }

    /// Remove a user and fill any freed seat from the waitlist.
    ///
    /// The owner can never leave. A user who isn't a member is a no-op.
    pub async fn remove_player(&self, user_id: &UserId) -> Result<Removal> {
        let _guard = self.writer.lock().await;

        if self.is_owned_by(user_id) {
            return Err(DomainError::OwnerCannotLeave(user_id.clone()));
        }
        self.ensure_open()?;

        let session_id = self.id();
        let messages = self.messages();

        let removal = if self.view.remove_from_confirmed(user_id)? {
            self.notify(user_id, &messages.removed, None).await;
            Removal::Confirmed
        } else if self.view.remove_from_waitlist(user_id)? {
            self.notify(user_id, &messages.removed_from_waitlist, None)
                .await;
            Removal::Waitlisted
        } else {
            return Ok(Removal::NotMember);
        };
        self.resolver.resolve_user(user_id)?.forget_session(&session_id)?;
        info!(session_id = %session_id, user_id = %user_id, ?removal, "Player removed");

        self.promote_locked().await?;
        self.refresh_announcement().await;
        Ok(removal)
    }

    /// Change capacity, promoting from the waitlist if it grew.
    ///
    /// Returns the promoted users in promotion order.
    pub async fn set_capacity(&self, capacity: usize) -> Result<Vec<UserId>> {
        let _guard = self.writer.lock().await;

        self.ensure_open()?;
        let confirmed = self.view.confirmed_len();
        if capacity < 1 || capacity < confirmed {
            return Err(DomainError::InvalidCapacity {
                requested: capacity,
                confirmed,
            });
        }

        self.view.set_capacity(capacity)?;
        info!(session_id = %self.id(), capacity, "Session capacity changed");

        let promoted = self.promote_locked().await?;
        self.refresh_announcement().await;
        self.fire_if_able_locked().await?;
        Ok(promoted)
    }

    /// Close the session, notify every member once and delete its record.
    ///
    /// `started` picks the "started" messages over "cancelled". Only the
    /// first call does anything; later calls return `Ok(false)`.
    pub async fn terminate(&self, started: bool) -> Result<bool> {
        let _guard = self.writer.lock().await;
        self.terminate_locked(started).await
    }

    /// Send `text` to the members, excluding the owner.
    ///
    /// Returns the number of users messaged.
    pub async fn broadcast(&self, text: &str, include_waitlist: bool) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        self.ensure_open()?;

        let owner = self.owner_id();
        let header = match &owner {
            Some(owner) => format!(
                "**Message from {} about {}:**",
                announcement::mention(owner),
                self.name()
            ),
            None => format!("**Message about {}:**", self.name()),
        };
        let message = format!("{header}\n{text}");

        let mut recipients = self.view.confirmed();
        if include_waitlist {
            recipients.extend(self.view.waitlisted());
        }

        let mut sent = 0;
        for user_id in recipients.iter().filter(|u| Some(*u) != owner.as_ref()) {
            self.deliver(user_id, &message).await;
            sent += 1;
        }
        debug!(session_id = %self.id(), sent, include_waitlist, "Broadcast sent");
        Ok(sent)
    }

    // ── Internals (writer lock held) ────────────────────────────────────

    fn ensure_open(&self) -> Result<()> {
        if self.view.is_closed() {
            return Err(DomainError::SessionClosed(self.id()));
        }
        Ok(())
    }

    async fn promote_locked(&self) -> Result<Vec<UserId>> {
        let session_id = self.id();
        let template = self.messages().promoted;
        let mut promoted = Vec::new();

        while self.view.confirmed_len() < self.view.capacity() {
            let Some(user_id) = self.view.promote_from_waitlist()? else {
                break;
            };
            self.resolver.resolve_user(&user_id)?.mark_joined(&session_id)?;
            self.notify(&user_id, &template, None).await;
            info!(session_id = %session_id, user_id = %user_id, "Promoted from waitlist");
            promoted.push(user_id);
        }
        Ok(promoted)
    }

    async fn fire_if_able_locked(&self) -> Result<bool> {
        let params = self.view.parameters();
        if params.fire_when_full
            && !self.view.is_closed()
            && self.view.confirmed_len() == params.capacity
        {
            info!(session_id = %self.id(), "Session full, firing");
            return self.terminate_locked(true).await;
        }
        Ok(false)
    }

    async fn terminate_locked(&self, started: bool) -> Result<bool> {
        if !self.view.mark_closed()? {
            debug!(session_id = %self.id(), "Session already closed");
            return Ok(false);
        }

        let record = self.view.snapshot();
        let session_id = record.session_id.clone();
        let messages = &record.parameters.messages;
        let (for_confirmed, for_waitlisted) = if started {
            (&messages.started, &messages.started_waitlisted)
        } else {
            (&messages.cancelled, &messages.cancelled)
        };

        for user_id in &record.confirmed {
            self.notify(user_id, for_confirmed, None).await;
        }
        for user_id in &record.waitlisted {
            self.notify(user_id, for_waitlisted, None).await;
        }

        let notifier = self.resolver.notifier();
        let outcome = if started {
            notifier
                .edit_announcement(&session_id, &announcement::render_started(&record))
                .await
        } else {
            notifier.delete_announcement(&session_id).await
        };
        if let Err(e) = outcome {
            warn!(session_id = %session_id, error = %e, "Failed to finalize announcement");
        }

        for user_id in record
            .confirmed
            .iter()
            .chain(&record.waitlisted)
            .chain(record.owner_id.as_ref())
        {
            self.resolver
                .resolve_user(user_id)?
                .forget_session(&session_id)?;
        }

        self.resolver
            .driver()
            .delete_session_from_database(&record.server_id, &session_id)?;
        self.resolver.forget_session(&session_id).await;

        info!(
            session_id = %session_id,
            started,
            confirmed = record.confirmed.len(),
            waitlisted = record.waitlisted.len(),
            "Session terminated"
        );
        Ok(true)
    }

    async fn refresh_announcement(&self) {
        if self.view.is_closed() {
            return;
        }
        let content = announcement::render(&self.view.snapshot());
        if let Err(e) = self
            .resolver
            .notifier()
            .edit_announcement(&self.id(), &content)
            .await
        {
            warn!(session_id = %self.id(), error = %e, "Failed to update announcement");
        }
    }

    fn messages(&self) -> MessageTemplates {
        self.view.parameters().messages
    }

    async fn notify(&self, user_id: &UserId, template: &str, position: Option<&str>) {
        let params = self.view.parameters();
        let url = params.url.as_deref().unwrap_or_default();
        let owner = self
            .view
            .owner_id()
            .map(|o| announcement::mention(&o))
            .unwrap_or_default();
        let text = render_template(
            template,
            &[
                ("name", params.name.as_str()),
                ("position", position.unwrap_or_default()),
                ("url", url),
                ("owner", owner.as_str()),
            ],
        );
        self.deliver(user_id, &text).await;
    }

    async fn deliver(&self, user_id: &UserId, text: &str) {
        if let Err(e) = self.resolver.notifier().send_direct(user_id, text).await {
            warn!(user_id = %user_id, error = %e, "Failed to deliver direct message");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}
