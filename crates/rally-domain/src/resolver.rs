//! Per-server lookup of sessions and users.
//!
//! The [`Resolver`] keeps a bounded recency cache of [`SessionView`]s in front
//! of the [`Driver`]. It is an accelerator only: views write through on every
//! mutation, so evicting one never loses data. Users are not cached.
//!
//! The cache is built on [`rally_cache::ViewCache`] with a [`DriverLoader`]
//! that fetches from the driver on a miss.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rally_cache::{CacheConfig, CacheStats, ViewCache, ViewLoader};
use rally_store::{Driver, SessionView, StoreError, WeakSessionView};
use rally_types::{ServerId, SessionId, SharedNotifier, UserId};
use tracing::{debug, trace};

use crate::session::Session;
use crate::user::User;
use crate::{DomainError, Result};

/// Handles that outlive their cache entry, keyed by session id.
type LiveViews = Arc<Mutex<HashMap<SessionId, WeakSessionView>>>;

/// Cache miss handler backed by the driver.
///
/// Before going to the backend it checks whether some caller still holds a
/// view of the session, and hands that one back instead of a second copy of
/// the record.
pub struct DriverLoader {
    server_id: ServerId,
    driver: Driver,
    live: LiveViews,
}

impl ViewLoader for DriverLoader {
    type Value = SessionView;

    fn load(&self, key: &str) -> rally_cache::Result<Option<SessionView>> {
        let session_id = SessionId::from(key);
        if let Some(view) = self.live.lock().get(&session_id).and_then(|w| w.upgrade()) {
            trace!(session_id = %session_id, "Reattached live session view");
            return Ok(Some(view));
        }

        match self.driver.get_session_view(&self.server_id, &session_id) {
            Ok(view) => {
                self.live.lock().insert(session_id, view.downgrade());
                Ok(Some(view))
            }
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(rally_cache::Error::load(e)),
        }
    }

    fn on_evict(&self, key: &str) {
        let session_id = SessionId::from(key);
        let mut live = self.live.lock();
        if live.get(&session_id).is_some_and(|w| w.upgrade().is_none()) {
            live.remove(&session_id);
        }
    }
}

/// Session and user lookup for one server.
pub struct Resolver {
    server_id: ServerId,
    driver: Driver,
    notifier: SharedNotifier,
    cache: ViewCache<DriverLoader>,
    live: LiveViews,
    writers: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl Resolver {
    pub fn new(
        server_id: ServerId,
        driver: Driver,
        notifier: SharedNotifier,
        cache_config: CacheConfig,
    ) -> Self {
        let live = LiveViews::default();
        let loader = DriverLoader {
            server_id: server_id.clone(),
            driver: driver.clone(),
            live: live.clone(),
        };
        Self {
            server_id,
            driver,
            notifier,
            cache: ViewCache::new(cache_config, loader),
            live,
            writers: Mutex::new(HashMap::new()),
        }
    }

    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn notifier(&self) -> &SharedNotifier {
        &self.notifier
    }

    /// Resolve a session through the cache.
    ///
    /// A hit moves the session to the most-recently-used end; a miss fetches
    /// it from the driver. Fails with `SessionNotFound` if it doesn't exist.
    pub async fn resolve_session(self: &Arc<Self>, session_id: &SessionId) -> Result<Session> {
        let view = self.cache.get_or_load(session_id.as_str()).await?;
        Ok(self.session_for(view))
    }

    /// Resolve a session, returning `None` instead of failing on a miss.
    pub async fn find_session(self: &Arc<Self>, session_id: &SessionId) -> Result<Option<Session>> {
        match self.resolve_session(session_id).await {
            Ok(session) => Ok(Some(session)),
            Err(DomainError::SessionNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Wrap a freshly created view and put it at the front of the cache.
    pub(crate) async fn register_session(self: &Arc<Self>, view: SessionView) -> Session {
        let session_id = view.session_id();
        self.live.lock().insert(session_id.clone(), view.downgrade());
        if let Some(evicted) = self.cache.insert(session_id.as_str(), view.clone()).await {
            trace!(server_id = %self.server_id, evicted = %evicted, "Session view evicted");
        }
        self.session_for(view)
    }

    /// Fetch a user, creating an empty record on first access.
    pub fn resolve_user(&self, user_id: &UserId) -> Result<User> {
        let view = self.driver.get_or_create_user_view(&self.server_id, user_id)?;
        Ok(User::new(view))
    }

    /// Fetch a user that must already exist.
    pub fn lookup_user(&self, user_id: &UserId) -> Result<User> {
        if self
            .driver
            .backend()
            .load_user(&self.server_id, user_id)?
            .is_none()
        {
            return Err(DomainError::UserNotFound(user_id.clone()));
        }
        self.resolve_user(user_id)
    }

    /// Drop every in-memory trace of a deleted session.
    pub async fn forget_session(&self, session_id: &SessionId) {
        self.cache.invalidate(session_id.as_str()).await;
        self.live.lock().remove(session_id);
        self.writers.lock().remove(session_id);
        debug!(server_id = %self.server_id, session_id = %session_id, "Session forgotten");
    }

    /// The lock serializing mutations of one session.
    pub(crate) fn writer(&self, session_id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        self.writers
            .lock()
            .entry(session_id.clone())
            .or_default()
            .clone()
    }

    pub async fn cached_session_ids(&self) -> Vec<SessionId> {
        self.cache
            .list_cached()
            .await
            .into_iter()
            .map(SessionId::from)
            .collect()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    fn session_for(self: &Arc<Self>, view: SessionView) -> Session {
        let writer = self.writer(&view.session_id());
        Session::new(view, Arc::clone(self), writer)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("server_id", &self.server_id)
            .field("backend", &self.driver.backend_kind())
            .field("cache_capacity", &self.cache.capacity())
            .finish()
    }
}
