//! Session scheduling domain for Rally.
//!
//! This crate turns external lifecycle events into admission, waitlist and
//! termination transitions over persisted session records:
//!
//! - **Session**: the admission/waitlist state machine over one session view
//! - **User**: membership bookkeeping over one user view
//! - **Resolver**: per-server lookup with a bounded session cache
//! - **Server**: orchestration of create/start/close/join/leave requests
//! - **ResolverRegistry**: the process-wide context object, plus startup
//!   reconciliation
//!
//! # Example
//!
//! ```ignore
//! use rally_domain::ResolverRegistry;
//!
//! let registry = ResolverRegistry::new(driver, notifier);
//! let server = registry.server(&"guild-1".into());
//!
//! let session = server.create_session(&"owner".into(), None).await?;
//! server.join_session(&session.id(), &"player".into()).await?;
//! ```

pub mod announcement;
mod error;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod session;
pub mod user;

pub use error::{DomainError, Result};
pub use registry::{ReconcileReport, ResolverRegistry};
pub use resolver::Resolver;
pub use server::Server;
pub use session::{Admission, Removal, Session};
pub use user::User;

// Re-export key types from the lower crates for convenience
pub use rally_cache::CacheStats;
pub use rally_store::{Driver, SessionRecord, StoreError, UserRecord};
pub use rally_types::{
    Notifier, NotifyError, ServerId, SessionId, SessionOverrides, SessionParameters,
    SharedNotifier, UserId,
};
