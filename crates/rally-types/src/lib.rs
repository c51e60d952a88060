//! Shared types for the Rally session scheduler.
//!
//! Everything here is used by more than one crate: the opaque identifiers,
//! the parameters that describe a session, and the [`Notifier`] trait the
//! chat-platform layer implements. The trait lives here so the domain crate
//! can depend on the contract without depending on any platform.

pub mod config;
pub mod ids;
pub mod notify;
pub mod params;

pub use config::{
    ConfigProvider, HasCacheConfig, HasStoreConfig, StaticConfig, StoreKind, defaults as config_defaults,
};
pub use ids::{ServerId, SessionId, UserId};
pub use notify::{JOIN_EMOJI, NotifyError, NotifyResult, Notifier, SharedNotifier};
pub use params::{DEFAULT_CAPACITY, MessageTemplates, SessionOverrides, SessionParameters, render_template};
