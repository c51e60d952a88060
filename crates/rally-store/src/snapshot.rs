use rally_types::{ServerId, SessionId, UserId};

use crate::backend::StoreBackend;
use crate::record::{SessionRecord, UserRecord};
use crate::{Result, StoreError};

/// Backend behind read-only views.
///
/// Views built from a bulk scan share this store, so any mutator on them
/// fails with [`StoreError::ReadOnly`] before the in-memory record changes.
/// Reads return nothing; a snapshot view never reloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotStore;

impl StoreBackend for SnapshotStore {
    fn kind(&self) -> &'static str {
        "snapshot"
    }

    fn insert_session(&self, _record: &SessionRecord) -> Result<()> {
        Err(StoreError::ReadOnly)
    }

    fn load_session(
        &self,
        _server_id: &ServerId,
        _session_id: &SessionId,
    ) -> Result<Option<SessionRecord>> {
        Ok(None)
    }

    fn save_session(&self, _record: &SessionRecord) -> Result<()> {
        Err(StoreError::ReadOnly)
    }

    fn delete_session(&self, _server_id: &ServerId, _session_id: &SessionId) -> Result<bool> {
        Err(StoreError::ReadOnly)
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        Ok(Vec::new())
    }

    fn load_user(&self, _server_id: &ServerId, _user_id: &UserId) -> Result<Option<UserRecord>> {
        Ok(None)
    }

    fn save_user(&self, _record: &UserRecord) -> Result<()> {
        Err(StoreError::ReadOnly)
    }

    fn update_user(
        &self,
        _seed: &UserRecord,
        _apply: &mut dyn FnMut(&mut UserRecord) -> bool,
    ) -> Result<UserRecord> {
        Err(StoreError::ReadOnly)
    }

    fn delete_user(&self, _server_id: &ServerId, _user_id: &UserId) -> Result<bool> {
        Err(StoreError::ReadOnly)
    }

    fn list_users(&self, _server_id: &ServerId) -> Result<Vec<UserRecord>> {
        Ok(Vec::new())
    }
}
