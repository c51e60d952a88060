//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rally_domain::{Driver, ResolverRegistry, Server};
use rally_store::{MemoryStore, SessionRecord, StoreBackend, UserRecord};
use rally_types::{
    Notifier, NotifyError, NotifyResult, ServerId, SessionId, SessionParameters, UserId,
};

/// Something the notifier was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Direct { user: UserId, text: String },
    Posted { session: SessionId, content: String },
    Edited { session: SessionId, content: String },
    Deleted { session: SessionId },
    Reacted { session: SessionId, emoji: String },
}

/// Notifier that records every call in order.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
    next_id: AtomicUsize,
    missing: Mutex<HashSet<SessionId>>,
    failing_users: Mutex<HashSet<UserId>>,
    yield_on_send: bool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Yields to the scheduler inside every call, so concurrent operations
    /// interleave at each notification.
    pub fn yielding() -> Arc<Self> {
        Arc::new(Self {
            yield_on_send: true,
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Direct messages sent to `user`, in order.
    pub fn directs_to(&self, user: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Direct { user: u, text } if u.as_str() == user => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn direct_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::Direct { .. }))
            .count()
    }

    /// Pretend the announcement was deleted out-of-band.
    pub fn forget_announcement(&self, session: &SessionId) {
        self.missing.lock().insert(session.clone());
    }

    /// Make direct messages to `user` fail.
    pub fn fail_deliveries_to(&self, user: &str) {
        self.failing_users.lock().insert(UserId::from(user));
    }

    async fn pause(&self) {
        if self.yield_on_send {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_direct(&self, user_id: &UserId, text: &str) -> NotifyResult<()> {
        self.pause().await;
        if self.failing_users.lock().contains(user_id) {
            return Err(NotifyError::Delivery(format!("cannot message {user_id}")));
        }
        self.events.lock().push(Event::Direct {
            user: user_id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn post_announcement(
        &self,
        _server_id: &ServerId,
        content: &str,
    ) -> NotifyResult<SessionId> {
        self.pause().await;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let session = SessionId::new(format!("msg-{n}"));
        self.events.lock().push(Event::Posted {
            session: session.clone(),
            content: content.to_string(),
        });
        Ok(session)
    }

    async fn edit_announcement(&self, session_id: &SessionId, content: &str) -> NotifyResult<()> {
        self.pause().await;
        if self.missing.lock().contains(session_id) {
            return Err(NotifyError::NotFound(session_id.to_string()));
        }
        self.events.lock().push(Event::Edited {
            session: session_id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn delete_announcement(&self, session_id: &SessionId) -> NotifyResult<()> {
        self.pause().await;
        self.events.lock().push(Event::Deleted {
            session: session_id.clone(),
        });
        Ok(())
    }

    async fn react_to_announcement(&self, session_id: &SessionId, emoji: &str) -> NotifyResult<()> {
        self.events.lock().push(Event::Reacted {
            session: session_id.clone(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }
}

/// Memory backend that counts session fetches.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    session_loads: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn session_loads(&self) -> usize {
        self.session_loads.load(Ordering::SeqCst)
    }
}

impl StoreBackend for CountingStore {
    fn kind(&self) -> &'static str {
        "counting"
    }

    fn insert_session(&self, record: &SessionRecord) -> rally_store::Result<()> {
        self.inner.insert_session(record)
    }

    fn load_session(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> rally_store::Result<Option<SessionRecord>> {
        self.session_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_session(server_id, session_id)
    }

    fn save_session(&self, record: &SessionRecord) -> rally_store::Result<()> {
        self.inner.save_session(record)
    }

    fn delete_session(
        &self,
        server_id: &ServerId,
        session_id: &SessionId,
    ) -> rally_store::Result<bool> {
        self.inner.delete_session(server_id, session_id)
    }

    fn list_sessions(&self) -> rally_store::Result<Vec<SessionRecord>> {
        self.inner.list_sessions()
    }

    fn load_user(
        &self,
        server_id: &ServerId,
        user_id: &UserId,
    ) -> rally_store::Result<Option<UserRecord>> {
        self.inner.load_user(server_id, user_id)
    }

    fn save_user(&self, record: &UserRecord) -> rally_store::Result<()> {
        self.inner.save_user(record)
    }

    fn update_user(
        &self,
        seed: &UserRecord,
        apply: &mut dyn FnMut(&mut UserRecord) -> bool,
    ) -> rally_store::Result<UserRecord> {
        self.inner.update_user(seed, apply)
    }

    fn delete_user(&self, server_id: &ServerId, user_id: &UserId) -> rally_store::Result<bool> {
        self.inner.delete_user(server_id, user_id)
    }

    fn list_users(&self, server_id: &ServerId) -> rally_store::Result<Vec<UserRecord>> {
        self.inner.list_users(server_id)
    }
}

/// A registry over a fresh memory store plus its recording notifier.
pub struct Harness {
    pub registry: ResolverRegistry,
    pub notifier: Arc<RecordingNotifier>,
    pub server: Server,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: Arc<RecordingNotifier>) -> Self {
        Self::build(Driver::in_memory(), notifier, SessionParameters::default())
    }

    pub fn with_defaults(defaults: SessionParameters) -> Self {
        Self::build(Driver::in_memory(), RecordingNotifier::new(), defaults)
    }

    pub fn build(
        driver: Driver,
        notifier: Arc<RecordingNotifier>,
        defaults: SessionParameters,
    ) -> Self {
        let registry =
            ResolverRegistry::new(driver, notifier.clone()).with_defaults(defaults);
        let server = registry.server(&"guild".into());
        Self {
            registry,
            notifier,
            server,
        }
    }
}

pub fn params(capacity: usize, fire_when_full: bool) -> SessionParameters {
    SessionParameters {
        name: "Raid".to_string(),
        capacity,
        fire_when_full,
        url: Some("https://example.test/raid".to_string()),
        ..Default::default()
    }
}
