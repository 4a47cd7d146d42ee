//! Matched credentials, the shared result sink, and the final report.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::classify::Outcome;

/// A username/password pair. Immutable once formed; only matched pairs
/// outlive their attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}

/// Append-only, thread-safe collection of matches.
///
/// Workers only ever append; the coordinator snapshots it when the run
/// reaches a terminal state (including an interrupted one).
#[derive(Debug, Default)]
pub struct ResultSet {
    matches: Mutex<Vec<Credential>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match. Never blocks beyond the append lock.
    pub fn record(&self, credential: Credential) {
        tracing::debug!(credential = %credential, "Recording match");
        self.matches.lock().push(credential);
    }

    /// Copy of everything recorded so far, in append order.
    pub fn snapshot(&self) -> Vec<Credential> {
        self.matches.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.matches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.lock().is_empty()
    }
}

/// Per-attempt progress event, emitted on the side channel when one is
/// attached. Not part of the correctness contract.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptEvent {
    pub worker: usize,
    pub username: String,
    pub password: String,
    pub outcome: Outcome,
}

/// Final report of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Matched credentials in append order.
    pub matches: Vec<Credential>,
    /// True when the run was stopped by an operator interrupt rather than
    /// exhausting the search space.
    pub interrupted: bool,
    /// Attempts actually issued (both outcomes, transport failures included).
    pub attempts: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
