//! Coordinator: spawns one worker per shard, aggregates results, and handles
//! interruption.
//!
//! The run moves `Idle -> Running -> {Completed, Cancelled}`. Both terminal
//! states produce a `Report`; `Cancelled` sets `interrupted` and leaves any
//! still-running workers detached rather than joining them, so the report is
//! emitted from whatever the result sink holds at that moment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::partition::partition;
use crate::results::{AttemptEvent, Report, ResultSet};
use crate::worker::Worker;

/// Unique identifier for a run, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        RunId(uuid)
    }
}

/// Drives a full brute-force run against an `HttpClient`.
pub struct Coordinator<H: HttpClient> {
    run_id: RunId,
    config: Arc<RunConfig>,
    client: H,
    results: Arc<ResultSet>,
    attempts: Arc<AtomicU64>,
    progress: Option<mpsc::UnboundedSender<AttemptEvent>>,
}

impl<H: HttpClient + 'static> Coordinator<H> {
    pub fn new(config: Arc<RunConfig>, client: H) -> Self {
        Self {
            run_id: RunId::from(Uuid::new_v4()),
            config,
            client,
            results: Arc::new(ResultSet::new()),
            attempts: Arc::new(AtomicU64::new(0)),
            progress: None,
        }
    }

    /// Attach a per-attempt progress channel.
    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<AttemptEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Run to a terminal state.
    ///
    /// Validates the configuration, partitions the password list, spawns one
    /// worker per shard, and waits for either exhaustion or cancellation.
    /// Cancellation mid-run is not an error: the report carries
    /// `interrupted = true` and whatever matches were recorded by then.
    #[tracing::instrument(skip(self, cancel), fields(run_id = %self.run_id))]
    pub async fn run(self, cancel: CancellationToken) -> Result<Report> {
        self.config.validate()?;
        let shards = partition(&self.config.passwords, self.config.threads)?;
        let started_at = Utc::now();

        tracing::info!(
            workers = shards.len(),
            usernames = self.config.usernames.len(),
            passwords = self.config.passwords.len(),
            target = %self.config.target,
            "Starting brute run"
        );

        let mut join_set: JoinSet<()> = JoinSet::new();
        for (index, shard) in shards.into_iter().enumerate() {
            let worker = Worker::new(
                index,
                self.config.clone(),
                shard,
                self.client.clone(),
                self.results.clone(),
                self.attempts.clone(),
                self.progress.clone(),
                cancel.clone(),
            );
            join_set.spawn(worker.run());
        }

        let interrupted = loop {
            tokio::select! {
                joined = join_set.join_next() => match joined {
                    None => break false,
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Worker task panicked");
                    }
                },
                _ = cancel.cancelled() => {
                    tracing::warn!("Interrupt received, collecting credentials");
                    // Best-effort shutdown: in-flight requests are neither
                    // aborted nor joined. Read the sink as it stands.
                    join_set.detach_all();
                    break true;
                }
            }
        };

        let report = Report {
            matches: self.results.snapshot(),
            interrupted,
            attempts: self.attempts.load(Ordering::Relaxed),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            matches = report.matches.len(),
            attempts = report.attempts,
            interrupted,
            "Run finished"
        );
        Ok(report)
    }
}
