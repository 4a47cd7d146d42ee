//! Worker: the double loop over a password shard and the full username list.
//!
//! Each worker owns one password shard and walks the shard × username
//! cross-product in deterministic order: passwords in shard order, usernames
//! in list order for each password. A transport failure is a failed attempt,
//! never a worker abort. Cancellation is checked between attempts; an
//! in-flight request is allowed to finish on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::classify::Outcome;
use crate::config::{HttpMethod, RunConfig};
use crate::error::Result;
use crate::http::{AuthCredentials, HttpClient, ProbeRequest};
use crate::results::{AttemptEvent, Credential, ResultSet};
use crate::template;

/// Build the resolved request for one candidate pair.
///
/// With an active auth strategy the target URL is used verbatim and the
/// credentials travel in the signing layer; otherwise they are substituted
/// into the URL template. A POST body template is resolved either way.
pub fn build_attempt(config: &RunConfig, username: &str, password: &str) -> Result<ProbeRequest> {
    let (url, auth) = if config.auth.is_none() {
        (template::resolve(&config.target, username, password), None)
    } else {
        (
            config.target.clone(),
            Some(AuthCredentials {
                scheme: config.auth,
                username: username.to_string(),
                password: password.to_string(),
            }),
        )
    };

    let body = match (&config.method, &config.body) {
        (HttpMethod::Post, Some(data)) => Some(template::resolve_body(
            data,
            username,
            password,
            config.json_body(),
        )?),
        _ => None,
    };

    Ok(ProbeRequest {
        method: config.method,
        url,
        headers: config.headers.clone(),
        body,
        auth,
    })
}

/// One worker task: a shard plus shared read-only run state.
pub struct Worker<H: HttpClient> {
    id: usize,
    config: Arc<RunConfig>,
    shard: Vec<String>,
    client: H,
    results: Arc<ResultSet>,
    attempts: Arc<AtomicU64>,
    progress: Option<mpsc::UnboundedSender<AttemptEvent>>,
    cancel: CancellationToken,
}

impl<H: HttpClient> Worker<H> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        config: Arc<RunConfig>,
        shard: Vec<String>,
        client: H,
        results: Arc<ResultSet>,
        attempts: Arc<AtomicU64>,
        progress: Option<mpsc::UnboundedSender<AttemptEvent>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            config,
            shard,
            client,
            results,
            attempts,
            progress,
            cancel,
        }
    }

    /// Exhaust the shard × username cross-product, or stop early on
    /// cancellation. Never returns an error: every failure is local to one
    /// attempt.
    #[tracing::instrument(skip(self), fields(worker = self.id, shard_len = self.shard.len()))]
    pub async fn run(self) {
        tracing::debug!("Worker starting");
        for password in &self.shard {
            for username in &self.config.usernames {
                if self.cancel.is_cancelled() {
                    tracing::debug!("Worker stopping on cancellation");
                    return;
                }
                self.attempt(username, password).await;
            }
        }
        tracing::debug!("Worker exhausted its shard");
    }

    async fn attempt(&self, username: &str, password: &str) {
        let request = match build_attempt(&self.config, username, password) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(username, error = %e, "Skipping attempt: could not build request");
                return;
            }
        };

        self.attempts.fetch_add(1, Ordering::Relaxed);

        let outcome = match self.client.send(&request, self.config.timeout_ms).await {
            Ok(response) => self.config.rule.classify(response.status, &response.body),
            Err(e) => {
                tracing::debug!(username, error = %e, "Attempt failed at transport level");
                Outcome::NoMatch
            }
        };

        if outcome.is_match() {
            tracing::info!(username, password, "Success");
            self.results.record(Credential::new(username, password));
        } else {
            tracing::trace!(username, password, "Failed");
        }

        if let Some(progress) = &self.progress {
            // A closed receiver just means nobody is listening anymore.
            let _ = progress.send(AttemptEvent {
                worker: self.id,
                username: username.to_string(),
                password: password.to_string(),
                outcome,
            });
        }
    }
}
