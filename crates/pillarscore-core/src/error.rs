//! Error types shared across pillarscore crates.
//!
//! Store errors live here rather than in `pillarscore-store` so the response
//! recorder can downcast and classify them (e.g. to retry on a share-token
//! collision) without string matching.

use thiserror::Error;

/// Errors raised while preparing a scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// A bottleneck cannot be identified without at least one pillar.
    #[error("configuration error: pillar registry is empty")]
    EmptyPillarRegistry,
}

/// Errors that can occur when talking to a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The share token is already taken by another response.
    #[error("share token already in use: {0}")]
    DuplicateShareToken(String),

    /// The backend answered with an error status.
    #[error("store error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("store request timed out after {0}s")]
    Timeout(u64),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if the failure means "pick another token and try again".
    pub fn is_token_collision(&self) -> bool {
        matches!(self, StoreError::DuplicateShareToken(_))
    }
}

/// Errors specific to recording a completed diagnostic.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Every generated token collided with an existing one.
    #[error("could not allocate a unique share token after {attempts} attempts")]
    TokenExhausted { attempts: u32 },
}
