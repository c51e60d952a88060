//! Storage abstraction for session and user records.
//!
//! # Architecture
//!
//! ```text
//! StoreBackend (trait)       - record read/write primitives
//!     └── MemoryStore        - process-local maps, no durability
//!     └── JsonFileStore      - one JSON document with `Sessions` and `Users`
//!     └── SnapshotStore      - rejects every write (read-only views)
//! ```
//!
//! Lookups and deletions match exact `(server_id, session_id)` or
//! `(server_id, user_id)` tuples. No operation spans more than one record.

use std::sync::Arc;

use rally_types::{ServerId, SessionId, UserId};

use crate::Result;
use crate::record::{SessionRecord, UserRecord};

pub trait StoreBackend: Send + Sync {
    /// Short name for logs (`memory`, `file`, `snapshot`).
    fn kind(&self) -> &'static str;

    // ── Sessions ────────────────────────────────────────────────────────

    /// Insert a new session. Fails with `AlreadyExists` on an id collision.
    fn insert_session(&self, record: &SessionRecord) -> Result<()>;

    fn load_session(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>>;

    /// Replace an existing session. Fails with `NotFound` if it was deleted,
    /// so a stale view can never revive a record.
    fn save_session(&self, record: &SessionRecord) -> Result<()>;

    /// Returns whether a record was removed.
    fn delete_session(&self, server_id: &ServerId, session_id: &SessionId) -> Result<bool>;

    /// Full scan over every server.
    fn list_sessions(&self) -> Result<Vec<SessionRecord>>;

    // ── Users ───────────────────────────────────────────────────────────

    fn load_user(&self, server_id: &ServerId, user_id: &UserId) -> Result<Option<UserRecord>>;

    /// Insert or replace.
    fn save_user(&self, record: &UserRecord) -> Result<()>;

    /// Read-modify-write of one user record.
    ///
    /// `apply` runs against the stored record, or against `seed` if none is
    /// stored, and returns whether it changed anything; only changed records
    /// are written. Returns the record as it now stands. Backends that can
    /// hold a lock across the read and the write should override this.
    fn update_user(
        &self,
        seed: &UserRecord,
        apply: &mut dyn FnMut(&mut UserRecord) -> bool,
    ) -> Result<UserRecord> {
        let mut record = self
            .load_user(&seed.server_id, &seed.user_id)?
            .unwrap_or_else(|| seed.clone());
        if apply(&mut record) {
            self.save_user(&record)?;
        }
        Ok(record)
    }

    /// Returns whether a record was removed.
    fn delete_user(&self, server_id: &ServerId, user_id: &UserId) -> Result<bool>;

    /// Full scan over one server.
    fn list_users(&self, server_id: &ServerId) -> Result<Vec<UserRecord>>;
}

/// Shared backend handle held by the driver and every view.
pub type SharedStore = Arc<dyn StoreBackend>;
