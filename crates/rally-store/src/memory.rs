use std::collections::BTreeMap;

use parking_lot::Mutex;
use rally_types::{ServerId, SessionId, UserId};

use crate::backend::StoreBackend;
use crate::record::{SessionRecord, UserRecord};
use crate::{Result, StoreError};

/// In-memory backend. Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<BTreeMap<(ServerId, SessionId), SessionRecord>>,
    users: Mutex<BTreeMap<(ServerId, UserId), UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn insert_session(&self, record: &SessionRecord) -> Result<()> {
        let key = (record.server_id.clone(), record.session_id.clone());
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&key) {
            return Err(StoreError::already_exists(&key.0, &key.1));
        }
        sessions.insert(key, record.clone());
        Ok(())
    }

    fn load_session(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>> {
        Ok(self
            .sessions
            .lock()
            .get(&(server_id.clone(), session_id.clone()))
            .cloned())
    }

    fn save_session(&self, record: &SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(&(record.server_id.clone(), record.session_id.clone())) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(&record.server_id, &record.session_id)),
        }
    }

    fn delete_session(&self, server_id: &ServerId, session_id: &SessionId) -> Result<bool> {
        Ok(self
            .sessions
            .lock()
            .remove(&(server_id.clone(), session_id.clone()))
            .is_some())
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions.lock().values().cloned().collect())
    }

    fn load_user(&self, server_id: &ServerId, user_id: &UserId) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .get(&(server_id.clone(), user_id.clone()))
            .cloned())
    }

    fn save_user(&self, record: &UserRecord) -> Result<()> {
        self.users.lock().insert(
            (record.server_id.clone(), record.user_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn update_user(
        &self,
        seed: &UserRecord,
        apply: &mut dyn FnMut(&mut UserRecord) -> bool,
    ) -> Result<UserRecord> {
        let key = (seed.server_id.clone(), seed.user_id.clone());
        let mut users = self.users.lock();
        let mut record = users.get(&key).cloned().unwrap_or_else(|| seed.clone());
        if apply(&mut record) {
            users.insert(key, record.clone());
        }
        Ok(record)
    }

    fn delete_user(&self, server_id: &ServerId, user_id: &UserId) -> Result<bool> {
        Ok(self
            .users
            .lock()
            .remove(&(server_id.clone(), user_id.clone()))
            .is_some())
    }

    fn list_users(&self, server_id: &ServerId) -> Result<Vec<UserRecord>> {
        Ok(self
            .users
            .lock()
            .values()
            .filter(|u| &u.server_id == server_id)
            .cloned()
            .collect())
    }
}
