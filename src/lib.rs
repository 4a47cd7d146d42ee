//! Concurrent HTTP credential brute-forcing engine.
//!
//! Given a target URL template, a username list, and a password list, the
//! engine partitions the password list into shards, runs one worker per
//! shard, and classifies every attempt as a match or non-match from the
//! response status or body. Matches are collected in a synchronized sink and
//! surfaced in a final `Report`, which also records whether the run was
//! interrupted by the operator.
//!
//! The HTTP layer sits behind the `HttpClient` trait so the whole engine can
//! be exercised against `MockHttpClient` without touching the network.

pub mod classify;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod partition;
pub mod results;
pub mod template;
pub mod wordlist;
pub mod worker;

// Re-export commonly used types
pub use classify::{MatchRule, Outcome};
pub use config::{AuthStrategy, HttpMethod, RunConfig};
pub use coordinator::{Coordinator, RunId};
pub use error::{PicklockError, Result};
pub use http::{
    AuthCredentials, HttpClient, HttpResponse, MockHttpClient, ProbeRequest, ReqwestHttpClient,
};
pub use partition::{partition, partition_with_rng};
pub use results::{AttemptEvent, Credential, Report, ResultSet};
