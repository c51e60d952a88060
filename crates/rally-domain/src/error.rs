//! Domain error types.

use rally_store::StoreError;
use rally_types::{NotifyError, SessionId, UserId};
use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The user already holds a seat or a waitlist spot.
    #[error("User {0} is already a member of this session")]
    AlreadyMember(UserId),

    /// The session has been terminated.
    #[error("Session {0} is closed")]
    SessionClosed(SessionId),

    #[error("User {0} owns this session and cannot leave it")]
    OwnerCannotLeave(UserId),

    /// Capacity below 1, or below the number of confirmed members.
    #[error("Invalid capacity {requested}: {confirmed} member(s) already confirmed")]
    InvalidCapacity { requested: usize, confirmed: usize },

    /// The user does not own an active session.
    #[error("User {0} has no active session")]
    NoActiveSession(UserId),

    #[error("Message is empty")]
    EmptyMessage,

    /// The user's created session is owned by someone else.
    #[error(
        "createdSessionId for user {user_id} does not match ownerId for session {session_id}"
    )]
    OwnershipMismatch {
        user_id: UserId,
        session_id: SessionId,
    },

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// A session with this id already exists.
    #[error("Session already exists: {0}")]
    AlreadyExists(SessionId),

    /// Mutation attempted through a read-only snapshot.
    #[error("Mutation attempted on a read-only snapshot")]
    ReadOnly,

    /// Storage error.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// The cache's loader failed with something other than a store error.
    #[error("Cache error: {0}")]
    Cache(#[source] rally_cache::BoxError),

    /// Notifier error.
    #[error("Notifier error: {0}")]
    Notify(#[from] NotifyError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { session_id, .. } => Self::SessionNotFound(session_id),
            StoreError::AlreadyExists { session_id, .. } => Self::AlreadyExists(session_id),
            StoreError::ReadOnly => Self::ReadOnly,
            StoreError::DuplicateMember(user_id) => Self::AlreadyMember(user_id),
            StoreError::InvalidCapacity(requested) => Self::InvalidCapacity {
                requested,
                confirmed: 0,
            },
            other => Self::Store(other),
        }
    }
}

impl From<rally_cache::Error> for DomainError {
    fn from(err: rally_cache::Error) -> Self {
        match err {
            rally_cache::Error::NotFound(key) => Self::SessionNotFound(key.into()),
            rally_cache::Error::Load(source) => match source.downcast::<StoreError>() {
                Ok(store) => Self::from(*store),
                Err(other) => Self::Cache(other),
            },
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
