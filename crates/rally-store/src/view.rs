//! Write-through views over single records.
//!
//! A view holds the current record behind a lock and a handle to its
//! backend. Every mutator builds the next record, writes it to the backend,
//! and only then replaces the in-memory copy, so a failed write leaves the
//! view unchanged. Cloning a view yields another handle to the same record.
//!
//! Views over a snapshot reject every mutator with [`StoreError::ReadOnly`],
//! even one that would have changed nothing.
//!
//! Session views are the only handle to their record (the resolver shares
//! one per session), so they write their in-memory copy. A user may be
//! held by several views at once, so user mutators re-read the stored
//! record and apply the change to that.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rally_types::{ServerId, SessionId, SessionParameters, UserId};
use tracing::trace;

use crate::backend::SharedStore;
use crate::record::{SessionRecord, UserRecord};
use crate::snapshot::SnapshotStore;
use crate::{Result, StoreError};

#[derive(Clone)]
pub struct SessionView {
    record: Arc<RwLock<SessionRecord>>,
    store: SharedStore,
}

impl std::fmt::Debug for SessionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionView")
            .field("record", &*self.record.read())
            .field("store", &self.store.kind())
            .finish()
    }
}

impl SessionView {
    pub(crate) fn new(record: SessionRecord, store: SharedStore) -> Self {
        Self {
            record: Arc::new(RwLock::new(record)),
            store,
        }
    }

    /// A view over a snapshot; every mutator fails with `ReadOnly`.
    pub fn read_only(record: SessionRecord) -> Self {
        Self::new(record, Arc::new(SnapshotStore))
    }

    pub fn is_read_only(&self) -> bool {
        self.store.kind() == "snapshot"
    }

    /// A handle that doesn't keep the record alive.
    pub fn downgrade(&self) -> WeakSessionView {
        WeakSessionView {
            record: Arc::downgrade(&self.record),
            store: self.store.clone(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn server_id(&self) -> ServerId {
        self.record.read().server_id.clone()
    }

    pub fn session_id(&self) -> SessionId {
        self.record.read().session_id.clone()
    }

    pub fn owner_id(&self) -> Option<UserId> {
        self.record.read().owner_id.clone()
    }

    pub fn confirmed(&self) -> Vec<UserId> {
        self.record.read().confirmed.clone()
    }

    pub fn waitlisted(&self) -> Vec<UserId> {
        self.record.read().waitlisted.clone()
    }

    pub fn confirmed_len(&self) -> usize {
        self.record.read().confirmed.len()
    }

    pub fn waitlisted_len(&self) -> usize {
        self.record.read().waitlisted.len()
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.record.read().is_member(user_id)
    }

    pub fn is_confirmed(&self, user_id: &UserId) -> bool {
        self.record.read().is_confirmed(user_id)
    }

    pub fn parameters(&self) -> SessionParameters {
        self.record.read().parameters.clone()
    }

    pub fn capacity(&self) -> usize {
        self.record.read().parameters.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.record.read().closed
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> SessionRecord {
        self.record.read().clone()
    }

    // ── Mutators ────────────────────────────────────────────────────────

    /// Append to the confirmed list.
    pub fn add_to_confirmed(&self, user_id: &UserId) -> Result<()> {
        self.mutate(|r| {
            if r.is_member(user_id) {
                return Err(StoreError::DuplicateMember(user_id.clone()));
            }
            r.confirmed.push(user_id.clone());
            Ok(())
        })
    }

    /// Returns whether the user was confirmed.
    pub fn remove_from_confirmed(&self, user_id: &UserId) -> Result<bool> {
        self.ensure_writable()?;
        if !self.is_confirmed(user_id) {
            return Ok(false);
        }
        self.mutate(|r| {
            r.confirmed.retain(|u| u != user_id);
            Ok(true)
        })
    }

    /// Append to the waitlist tail. Returns the 1-based position.
    pub fn add_to_waitlist(&self, user_id: &UserId) -> Result<usize> {
        self.mutate(|r| {
            if r.is_member(user_id) {
                return Err(StoreError::DuplicateMember(user_id.clone()));
            }
            r.waitlisted.push(user_id.clone());
            Ok(r.waitlisted.len())
        })
    }

    /// Returns whether the user was waitlisted.
    pub fn remove_from_waitlist(&self, user_id: &UserId) -> Result<bool> {
        self.ensure_writable()?;
        if !self.record.read().is_waitlisted(user_id) {
            return Ok(false);
        }
        self.mutate(|r| {
            r.waitlisted.retain(|u| u != user_id);
            Ok(true)
        })
    }

    /// Move the front of the waitlist to the confirmed tail in one write.
    pub fn promote_from_waitlist(&self) -> Result<Option<UserId>> {
        self.ensure_writable()?;
        if self.waitlisted_len() == 0 {
            return Ok(None);
        }
        self.mutate(|r| {
            let user = r.waitlisted.remove(0);
            r.confirmed.push(user.clone());
            Ok(Some(user))
        })
    }

    pub fn set_capacity(&self, capacity: usize) -> Result<()> {
        self.mutate(|r| {
            if capacity == 0 {
                return Err(StoreError::InvalidCapacity(capacity));
            }
            r.parameters.capacity = capacity;
            Ok(())
        })
    }

    /// Set `closed`. Returns `false` if it was already set.
    pub fn mark_closed(&self) -> Result<bool> {
        self.ensure_writable()?;
        if self.is_closed() {
            return Ok(false);
        }
        self.mutate(|r| {
            r.closed = true;
            Ok(true)
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut SessionRecord) -> Result<R>) -> Result<R> {
        self.ensure_writable()?;
        let mut guard = self.record.write();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.store.save_session(&next)?;
        trace!(
            session_id = %next.session_id,
            confirmed = next.confirmed.len(),
            waitlisted = next.waitlisted.len(),
            "Session record written"
        );
        *guard = next;
        Ok(out)
    }
}

/// Non-owning [`SessionView`] handle.
///
/// Lets a cache recover the view some caller still holds after the cache
/// itself has dropped it, so two live handles never diverge.
#[derive(Clone)]
pub struct WeakSessionView {
    record: Weak<RwLock<SessionRecord>>,
    store: SharedStore,
}

impl WeakSessionView {
    pub fn upgrade(&self) -> Option<SessionView> {
        self.record.upgrade().map(|record| SessionView {
            record,
            store: self.store.clone(),
        })
    }
}

#[derive(Clone)]
pub struct UserView {
    record: Arc<RwLock<UserRecord>>,
    store: SharedStore,
}

impl std::fmt::Debug for UserView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserView")
            .field("record", &*self.record.read())
            .field("store", &self.store.kind())
            .finish()
    }
}

impl UserView {
    pub(crate) fn new(record: UserRecord, store: SharedStore) -> Self {
        Self {
            record: Arc::new(RwLock::new(record)),
            store,
        }
    }

    pub fn read_only(record: UserRecord) -> Self {
        Self::new(record, Arc::new(SnapshotStore))
    }

    pub fn server_id(&self) -> ServerId {
        self.record.read().server_id.clone()
    }

    pub fn user_id(&self) -> UserId {
        self.record.read().user_id.clone()
    }

    pub fn created_session_id(&self) -> Option<SessionId> {
        self.record.read().created_session_id.clone()
    }

    pub fn joined_session_ids(&self) -> Vec<SessionId> {
        self.record.read().joined_session_ids.iter().cloned().collect()
    }

    pub fn waitlisted_session_ids(&self) -> Vec<SessionId> {
        self.record
            .read()
            .waitlisted_session_ids
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.record.read().is_idle()
    }

    pub fn snapshot(&self) -> UserRecord {
        self.record.read().clone()
    }

    /// Record a confirmed membership (also leaves the waitlist set).
    pub fn add_joined(&self, session_id: &SessionId) -> Result<()> {
        self.mutate(|r| {
            let left = r.waitlisted_session_ids.remove(session_id);
            r.joined_session_ids.insert(session_id.clone()) || left
        })?;
        Ok(())
    }

    pub fn add_waitlisted(&self, session_id: &SessionId) -> Result<()> {
        self.mutate(|r| {
            let left = r.joined_session_ids.remove(session_id);
            r.waitlisted_session_ids.insert(session_id.clone()) || left
        })?;
        Ok(())
    }

    /// Drop every reference to `session_id`. Returns whether any existed.
    pub fn forget_session(&self, session_id: &SessionId) -> Result<bool> {
        self.mutate(|r| {
            let joined = r.joined_session_ids.remove(session_id);
            let waitlisted = r.waitlisted_session_ids.remove(session_id);
            let owned = r.created_session_id.as_ref() == Some(session_id);
            if owned {
                r.created_session_id = None;
            }
            joined || waitlisted || owned
        })
    }

    pub fn set_created_session(&self, session_id: Option<SessionId>) -> Result<()> {
        self.mutate(|r| {
            if r.created_session_id == session_id {
                return false;
            }
            r.created_session_id = session_id.clone();
            true
        })?;
        Ok(())
    }

    /// Apply `f` to the stored record and adopt the result. `f` reports
    /// whether it changed anything.
    fn mutate(&self, mut f: impl FnMut(&mut UserRecord) -> bool) -> Result<bool> {
        let mut guard = self.record.write();
        let mut changed = false;
        let current = self.store.update_user(&guard, &mut |r| {
            changed = f(r);
            changed
        })?;
        if changed {
            trace!(user_id = %current.user_id, "User record written");
        }
        *guard = current;
        Ok(changed)
    }
}
