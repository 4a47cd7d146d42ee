//! Error types for the brute-forcing engine.

use thiserror::Error;

/// Result type alias using the picklock error type.
pub type Result<T> = std::result::Result<T, PicklockError>;

/// Main error type for the brute-forcing engine.
#[derive(Error, Debug)]
pub enum PicklockError {
    /// Invalid run setup. Surfaced before any work starts; fatal, no partial run.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A single request's network failure. Workers recover from this locally
    /// by treating the attempt as a non-match.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization error while encoding a JSON request body.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PicklockError {
    /// True for failures a worker absorbs as a failed attempt rather than
    /// aborting the run.
    pub fn is_transport(&self) -> bool {
        matches!(self, PicklockError::Transport(_))
    }
}
