use std::sync::Arc;

use rally_types::{
    HasStoreConfig, ServerId, SessionId, SessionOverrides, SessionParameters, StoreKind, UserId,
};
use tracing::{debug, info};

use crate::backend::{SharedStore, StoreBackend};
use crate::file::JsonFileStore;
use crate::memory::MemoryStore;
use crate::record::{SessionRecord, UserRecord};
use crate::view::{SessionView, UserView};
use crate::{Result, StoreError};

/// Record lifecycle over one backend.
///
/// The driver owns the backend; views it hands out share the handle and
/// write through it.
#[derive(Clone)]
pub struct Driver {
    store: SharedStore,
}

impl Driver {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn open_file(path: &std::path::Path) -> Result<Self> {
        Ok(Self::new(Arc::new(JsonFileStore::open(path)?)))
    }

    /// Open whichever backend the configuration selects.
    pub fn from_config<C: HasStoreConfig>(config: &C) -> Result<Self> {
        let driver = match config.store_kind() {
            StoreKind::Memory => Self::in_memory(),
            StoreKind::File => Self::open_file(&config.store_path())?,
        };
        info!(backend = driver.backend_kind(), "Store opened");
        Ok(driver)
    }

    pub fn backend_kind(&self) -> &'static str {
        self.store.kind()
    }

    // ── Sessions ────────────────────────────────────────────────────────

    /// Persist a new session from `defaults` with `overrides` layered on top.
    pub fn create_session(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
        owner_id: Option<&UserId>,
        defaults: &SessionParameters,
        overrides: Option<&SessionOverrides>,
    ) -> Result<SessionView> {
        let mut parameters = defaults.clone();
        if let Some(overrides) = overrides {
            parameters.apply(overrides);
        }
        if parameters.capacity == 0 {
            return Err(StoreError::InvalidCapacity(0));
        }

        let record = SessionRecord::new(
            server_id.clone(),
            session_id.clone(),
            owner_id.cloned(),
            parameters,
        );
        self.store.insert_session(&record)?;
        debug!(server_id = %server_id, session_id = %session_id, "Session record created");
        Ok(SessionView::new(record, self.store.clone()))
    }

    pub fn get_session_view(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<SessionView> {
        self.store
            .load_session(server_id, session_id)?
            .map(|record| SessionView::new(record, self.store.clone()))
            .ok_or_else(|| StoreError::not_found(server_id, session_id))
    }

    /// Returns whether a record was removed.
    pub fn delete_session_from_database(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> Result<bool> {
        let removed = self.store.delete_session(server_id, session_id)?;
        debug!(server_id = %server_id, session_id = %session_id, removed, "Session record deleted");
        Ok(removed)
    }

    /// Read-only views over every stored session.
    pub fn get_all_sessions(&self) -> Result<Vec<SessionView>> {
        Ok(self
            .store
            .list_sessions()?
            .into_iter()
            .map(SessionView::read_only)
            .collect())
    }

    // ── Users ───────────────────────────────────────────────────────────

    /// Fetch the user, creating an empty record on first access.
    pub fn get_or_create_user_view(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
    ) -> Result<UserView> {
        let record = match self.store.load_user(server_id, user_id)? {
            Some(record) => record,
            None => {
                let record = UserRecord::new(server_id.clone(), user_id.clone());
                self.store.save_user(&record)?;
                debug!(server_id = %server_id, user_id = %user_id, "User record created");
                record
            }
        };
        Ok(UserView::new(record, self.store.clone()))
    }

    pub fn delete_user_from_database(&self, server_id: &ServerId, user_id: &UserId) -> Result<bool> {
        self.store.delete_user(server_id, user_id)
    }

    /// Read-only views over every user of one server.
    pub fn get_all_users_from_server(&self, server_id: &ServerId) -> Result<Vec<UserView>> {
        Ok(self
            .store
            .list_users(server_id)?
            .into_iter()
            .map(UserView::read_only)
            .collect())
    }

    /// Direct backend access for callers composing their own scans.
    pub fn backend(&self) -> &dyn StoreBackend {
        self.store.as_ref()
    }
}
