use rally_types::{ServerId, SessionId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session already exists: {server_id}/{session_id}")]
    AlreadyExists {
        server_id: ServerId,
        session_id: SessionId,
    },

    #[error("Session not found: {server_id}/{session_id}")]
    NotFound {
        server_id: ServerId,
        session_id: SessionId,
    },

    #[error("Mutation attempted on a read-only snapshot")]
    ReadOnly,

    #[error("User {0} is already a member of this session")]
    DuplicateMember(UserId),

    #[error("Invalid capacity: {0}")]
    InvalidCapacity(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(server_id: &ServerId, session_id: &SessionId) -> Self {
        Self::NotFound {
            server_id: server_id.clone(),
            session_id: session_id.clone(),
        }
    }

    pub(crate) fn already_exists(server_id: &ServerId, session_id: &SessionId) -> Self {
        Self::AlreadyExists {
            server_id: server_id.clone(),
            session_id: session_id.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
