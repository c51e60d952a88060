use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rally_types::{ServerId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::backend::StoreBackend;
use crate::record::{SessionRecord, UserRecord};
use crate::{Result, StoreError};

/// On-disk layout: one JSON document, two top-level arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(rename = "Sessions", default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(rename = "Users", default)]
    pub users: Vec<UserRecord>,
}

/// File-backed document store.
///
/// Every call reads the document, changes at most one record, and rewrites
/// the file before returning. The internal mutex serializes callers within
/// one process; nothing guards against a second process writing the same
/// file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the document at `path`, creating it (and its parent dirs) if
    /// missing.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let store = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };
        if !path.exists() {
            debug!(path = %path.display(), "Creating empty store document");
            store.write(&StoreDocument::default())?;
        } else {
            // Fail early on a corrupt file rather than on first use
            store.read()?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreDocument> {
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, doc: &StoreDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        trace!(
            path = %self.path.display(),
            sessions = doc.sessions.len(),
            users = doc.users.len(),
            "Store document written"
        );
        Ok(())
    }

    /// Read, mutate, write under the process-local lock.
    fn update<R>(&self, f: impl FnOnce(&mut StoreDocument) -> Result<R>) -> Result<R> {
        let _guard = self.lock.lock();
        let mut doc = self.read()?;
        let out = f(&mut doc)?;
        self.write(&doc)?;
        Ok(out)
    }

    fn view<R>(&self, f: impl FnOnce(StoreDocument) -> R) -> Result<R> {
        let _guard = self.lock.lock();
        Ok(f(self.read()?))
    }
}

impl StoreBackend for JsonFileStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn insert_session(&self, record: &SessionRecord) -> Result<()> {
        self.update(|doc| {
            if doc
                .sessions
                .iter()
                .any(|s| s.matches(&record.server_id, &record.session_id))
            {
                return Err(StoreError::already_exists(
                    &record.server_id,
                    &record.session_id,
                ));
            }
            doc.sessions.push(record.clone());
            Ok(())
        })
    }

    fn load_session(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>> {
        self.view(|doc| {
            doc.sessions
                .into_iter()
                .find(|s| s.matches(server_id, session_id))
        })
    }

    fn save_session(&self, record: &SessionRecord) -> Result<()> {
        self.update(|doc| {
            match doc
                .sessions
                .iter_mut()
                .find(|s| s.matches(&record.server_id, &record.session_id))
            {
                Some(existing) => {
                    *existing = record.clone();
                    Ok(())
                }
                None => Err(StoreError::not_found(&record.server_id, &record.session_id)),
            }
        })
    }

    fn delete_session(&self, server_id: &ServerId, session_id: &SessionId) -> Result<bool> {
        self.update(|doc| {
            let before = doc.sessions.len();
            doc.sessions.retain(|s| !s.matches(server_id, session_id));
            Ok(doc.sessions.len() != before)
        })
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.view(|doc| doc.sessions)
    }

    fn load_user(&self, server_id: &ServerId, user_id: &UserId) -> Result<Option<UserRecord>> {
        self.view(|doc| doc.users.into_iter().find(|u| u.matches(server_id, user_id)))
    }

    fn save_user(&self, record: &UserRecord) -> Result<()> {
        self.update(|doc| {
            match doc
                .users
                .iter_mut()
                .find(|u| u.matches(&record.server_id, &record.user_id))
            {
                Some(existing) => *existing = record.clone(),
                None => doc.users.push(record.clone()),
            }
            Ok(())
        })
    }

    fn update_user(
        &self,
        seed: &UserRecord,
        apply: &mut dyn FnMut(&mut UserRecord) -> bool,
    ) -> Result<UserRecord> {
        let _guard = self.lock.lock();
        let mut doc = self.read()?;
        let slot = doc
            .users
            .iter()
            .position(|u| u.matches(&seed.server_id, &seed.user_id));
        let mut record = slot
            .map(|i| doc.users[i].clone())
            .unwrap_or_else(|| seed.clone());
        if apply(&mut record) {
            match slot {
                Some(i) => doc.users[i] = record.clone(),
                None => doc.users.push(record.clone()),
            }
            self.write(&doc)?;
        }
        Ok(record)
    }

    fn delete_user(&self, server_id: &ServerId, user_id: &UserId) -> Result<bool> {
        self.update(|doc| {
            let before = doc.users.len();
            doc.users.retain(|u| !u.matches(server_id, user_id));
            Ok(doc.users.len() != before)
        })
    }

    fn list_users(&self, server_id: &ServerId) -> Result<Vec<UserRecord>> {
        self.view(|doc| {
            doc.users
                .into_iter()
                .filter(|u| &u.server_id == server_id)
                .collect()
        })
    }
}
