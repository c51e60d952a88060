//! Process-wide registry of per-server resolvers.
//!
//! [`ResolverRegistry`] is the context object the application builds at
//! startup: it owns the driver, the notifier and the session defaults, and
//! lazily creates one [`Resolver`] per server on first use. Resolvers are
//! never evicted; the registry is bounded by the number of servers.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use rally_cache::CacheConfig;
use rally_store::Driver;
use rally_types::{
    HasCacheConfig, NotifyError, ServerId, SessionId, SessionParameters, SharedNotifier,
};
use tracing::{debug, info, warn};

use crate::announcement;
use crate::resolver::Resolver;
use crate::server::Server;
use crate::{DomainError, Result};

/// Outcome of [`ResolverRegistry::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub sessions_checked: usize,
    /// Sessions deleted because their announcement was gone or they were
    /// left closed.
    pub sessions_dropped: usize,
    /// Users that had references to missing sessions removed.
    pub users_repaired: usize,
    /// Users deleted because nothing referenced them any more.
    pub users_deleted: usize,
}

pub struct ResolverRegistry {
    driver: Driver,
    notifier: SharedNotifier,
    defaults: SessionParameters,
    cache_config: CacheConfig,
    resolvers: Mutex<HashMap<ServerId, Arc<Resolver>>>,
}

impl ResolverRegistry {
    pub fn new(driver: Driver, notifier: SharedNotifier) -> Self {
        Self {
            driver,
            notifier,
            defaults: SessionParameters::default(),
            cache_config: CacheConfig::default(),
            resolvers: Mutex::new(HashMap::new()),
        }
    }

    /// Build a registry sized from an application config.
    pub fn from_config<C: HasCacheConfig>(
        driver: Driver,
        notifier: SharedNotifier,
        config: &C,
    ) -> Self {
        Self::new(driver, notifier).with_cache_config(
            CacheConfig::new().with_max_sessions(config.max_cached_sessions()),
        )
    }

    /// Parameters new sessions start from.
    pub fn with_defaults(mut self, defaults: SessionParameters) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_cache_config(mut self, cache_config: CacheConfig) -> Self {
        self.cache_config = cache_config;
        self
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn defaults(&self) -> &SessionParameters {
        &self.defaults
    }

    /// The resolver for `server_id`, created on first request.
    pub fn resolver(&self, server_id: &ServerId) -> Arc<Resolver> {
        self.resolvers
            .lock()
            .entry(server_id.clone())
            .or_insert_with(|| {
                debug!(server_id = %server_id, "Creating resolver");
                Arc::new(Resolver::new(
                    server_id.clone(),
                    self.driver.clone(),
                    self.notifier.clone(),
                    self.cache_config.clone(),
                ))
            })
            .clone()
    }

    pub fn server(&self, server_id: &ServerId) -> Server {
        Server::new(self.resolver(server_id), self.defaults.clone())
    }

    pub fn len(&self) -> usize {
        self.resolvers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.lock().is_empty()
    }

    /// Drop every resolver, and with them their caches.
    pub fn shutdown(&self) {
        let dropped = std::mem::take(&mut *self.resolvers.lock()).len();
        info!(resolvers = dropped, "Resolver registry shut down");
    }

    /// Bring stored state back in line with the outside world.
    ///
    /// Every session's announcement is re-rendered; a session whose
    /// announcement no longer exists, or that was left closed, is deleted.
    /// Users are then scrubbed of references to missing sessions, and users
    /// left with none are deleted.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let mut servers = BTreeSet::new();
        let mut live: HashSet<(ServerId, SessionId)> = HashSet::new();

        for snapshot in self.driver.get_all_sessions()? {
            report.sessions_checked += 1;
            let server_id = snapshot.server_id();
            let session_id = snapshot.session_id();
            servers.insert(server_id.clone());

            let keep = if snapshot.is_closed() {
                debug!(session_id = %session_id, "Dropping session left closed");
                false
            } else {
                let content = announcement::render(&snapshot.snapshot());
                match self.notifier.edit_announcement(&session_id, &content).await {
                    Ok(()) => true,
                    Err(NotifyError::NotFound(_)) => {
                        info!(session_id = %session_id, "Announcement gone, dropping session");
                        false
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Failed to refresh announcement");
                        true
                    }
                }
            };

            if keep {
                live.insert((server_id, session_id));
            } else {
                self.driver
                    .delete_session_from_database(&server_id, &session_id)?;
                self.resolver(&server_id).forget_session(&session_id).await;
                report.sessions_dropped += 1;
            }
        }

        servers.extend(self.resolvers.lock().keys().cloned());
        for server_id in &servers {
            let resolver = self.resolver(server_id);
            for snapshot in self.driver.get_all_users_from_server(server_id)? {
                let user_id = snapshot.user_id();
                let dangling: Vec<SessionId> = snapshot
                    .joined_session_ids()
                    .into_iter()
                    .chain(snapshot.waitlisted_session_ids())
                    .chain(snapshot.created_session_id())
                    .filter(|id| !live.contains(&(server_id.clone(), id.clone())))
                    .collect();

                if !dangling.is_empty() {
                    let user = match resolver.lookup_user(&user_id) {
                        Ok(user) => user,
                        Err(DomainError::UserNotFound(_)) => continue,
                        Err(e) => return Err(e),
                    };
                    for session_id in &dangling {
                        user.forget_session(session_id)?;
                    }
                    report.users_repaired += 1;
                    debug!(user_id = %user_id, dangling = dangling.len(), "User references repaired");
                    if !user.is_idle() {
                        continue;
                    }
                } else if !snapshot.is_idle() {
                    continue;
                }

                if self.driver.delete_user_from_database(server_id, &user_id)? {
                    report.users_deleted += 1;
                }
            }
        }

        info!(
            sessions_checked = report.sessions_checked,
            sessions_dropped = report.sessions_dropped,
            users_repaired = report.users_repaired,
            users_deleted = report.users_deleted,
            "Reconciliation complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("backend", &self.driver.backend_kind())
            .field("resolvers", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rally_types::{Notifier, NotifyResult, StaticConfig, UserId};

    use super::*;

    struct Silent;

    #[async_trait]
    impl Notifier for Silent {
        async fn send_direct(&self, _: &UserId, _: &str) -> NotifyResult<()> {
            Ok(())
        }

        async fn post_announcement(&self, _: &ServerId, _: &str) -> NotifyResult<SessionId> {
            Ok(SessionId::from("a1"))
        }

        async fn edit_announcement(&self, _: &SessionId, _: &str) -> NotifyResult<()> {
            Ok(())
        }

        async fn delete_announcement(&self, _: &SessionId) -> NotifyResult<()> {
            Ok(())
        }

        async fn react_to_announcement(&self, _: &SessionId, _: &str) -> NotifyResult<()> {
            Ok(())
        }
    }

    fn registry() -> ResolverRegistry {
        ResolverRegistry::new(Driver::in_memory(), Arc::new(Silent))
    }

    #[test]
    fn test_resolvers_are_created_once_per_server() {
        let registry = registry();
        assert!(registry.is_empty());

        let a = registry.resolver(&"g1".into());
        let again = registry.resolver(&"g1".into());
        let b = registry.resolver(&"g2".into());

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_shutdown_drops_resolvers() {
        let registry = registry();
        registry.resolver(&"g1".into());
        registry.shutdown();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_cache_size_from_config() {
        let config = StaticConfig {
            max_cached_sessions: 2,
            ..Default::default()
        };
        let registry = ResolverRegistry::from_config(Driver::in_memory(), Arc::new(Silent), &config);
        let stats = registry.resolver(&"g1".into()).cache_stats().await;
        assert_eq!(stats.capacity, 2);
    }

    #[tokio::test]
    async fn test_empty_store_reconciles_to_nothing() {
        let report = registry().reconcile().await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }
}
