//! Error types for cache operations.

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The loader found nothing for this key.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The loader failed.
    #[error("Load error: {0}")]
    Load(#[source] BoxError),
}

/// Underlying loader failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Error {
    pub fn load(err: impl Into<BoxError>) -> Self {
        Self::Load(err.into())
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
