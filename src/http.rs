//! HTTP client abstraction for issuing credential attempts.
//!
//! This module defines the `HttpClient` trait to abstract HTTP request
//! execution, enabling testability with mock implementations. The production
//! implementation wraps `reqwest` and owns the request-signing strategies
//! (basic and digest); the engine never talks to `reqwest` directly.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::{AuthStrategy, HttpMethod, RunConfig};
use crate::error::{PicklockError, Result};

/// Response from an HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a string
    pub body: String,
}

/// Credentials attached to a request when an auth strategy is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub scheme: AuthStrategy,
    pub username: String,
    pub password: String,
}

/// One fully resolved attempt, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub auth: Option<AuthCredentials>,
}

/// Trait for executing HTTP attempts.
///
/// This abstraction keeps the worker loop testable without real network
/// calls; see `MockHttpClient`.
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Execute a single attempt.
    ///
    /// # Errors
    /// Returns an error when the request fails at the transport level
    /// (connection failure, timeout, invalid URL). Callers treat that as a
    /// failed attempt, not a fatal condition.
    async fn send(&self, request: &ProbeRequest, timeout_ms: u64) -> Result<HttpResponse>;
}

// ============================================================================
// Production implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client for a run, applying the configured proxy.
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    fn build(&self, request: &ProbeRequest, timeout_ms: u64) -> Result<reqwest::RequestBuilder> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| PicklockError::Config(format!("invalid header name {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PicklockError::Config(format!("invalid header value for {key}: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .timeout(Duration::from_millis(timeout_ms));

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder)
    }

    async fn send_digest(
        &self,
        request: &ProbeRequest,
        auth: &AuthCredentials,
        timeout_ms: u64,
    ) -> Result<HttpResponse> {
        // First leg without credentials, to collect the challenge.
        let first = self.build(request, timeout_ms)?.send().await?;
        let challenge = first
            .headers()
            .get("WWW-Authenticate")
            .and_then(|h| h.to_str().ok())
            .filter(|h| first.status().as_u16() == 401 && h.to_lowercase().contains("digest"))
            .map(parse_digest_challenge);

        let Some(challenge) = challenge else {
            // No digest challenge offered; the first response is the answer.
            let status = first.status().as_u16();
            let body = first.text().await?;
            return Ok(HttpResponse { status, body });
        };

        let authorization = digest_authorization(
            request.method.as_str(),
            &request.url,
            &auth.username,
            &auth.password,
            &challenge,
        );

        let second = self
            .build(request, timeout_ms)?
            .header("Authorization", authorization)
            .send()
            .await?;
        let status = second.status().as_u16();
        let body = second.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &ProbeRequest, timeout_ms: u64) -> Result<HttpResponse> {
        tracing::trace!(timeout_ms, "Executing attempt");

        match &request.auth {
            Some(auth) if auth.scheme == AuthStrategy::Digest => {
                return self.send_digest(request, auth, timeout_ms).await;
            }
            Some(auth) if auth.scheme == AuthStrategy::Ntlm => {
                // Rejected during config validation; kept as a guard for
                // callers that bypass RunConfig::validate.
                return Err(PicklockError::Config(
                    "NTLM authentication is not supported by this client".into(),
                ));
            }
            _ => {}
        }

        let mut builder = self.build(request, timeout_ms)?;
        if let Some(auth) = &request.auth {
            if auth.scheme == AuthStrategy::Basic {
                builder = builder.basic_auth(&auth.username, Some(&auth.password));
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::trace!(status, response_len = body.len(), "Attempt completed");
        Ok(HttpResponse { status, body })
    }
}

/// Parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
}

fn challenge_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(realm|nonce|qop)=["']?([^,"'\s]+)["']?"#).expect("static regex")
    })
}

pub(crate) fn parse_digest_challenge(www_authenticate: &str) -> DigestChallenge {
    let mut challenge = DigestChallenge {
        realm: String::new(),
        nonce: String::new(),
        qop: None,
    };
    for cap in challenge_field().captures_iter(www_authenticate) {
        let value = cap[2].to_string();
        match cap[1].to_lowercase().as_str() {
            "realm" => challenge.realm = value,
            "nonce" => challenge.nonce = value,
            "qop" => challenge.qop = Some(value),
            _ => {}
        }
    }
    challenge
}

pub(crate) fn digest_authorization(
    method: &str,
    url: &str,
    username: &str,
    password: &str,
    challenge: &DigestChallenge,
) -> String {
    let uri = url::Url::parse(url)
        .map(|u| match u.query() {
            Some(q) => format!("{}?{}", u.path(), q),
            None => u.path().to_string(),
        })
        .unwrap_or_else(|_| "/".to_string());

    let ha1 = format!(
        "{:x}",
        md5::compute(format!("{}:{}:{}", username, challenge.realm, password))
    );
    let ha2 = format!("{:x}", md5::compute(format!("{method}:{uri}")));

    match &challenge.qop {
        Some(qop) => {
            let cnonce = format!("{:x}", md5::compute(format!("{username}:{password}")));
            let response = format!(
                "{:x}",
                md5::compute(format!(
                    "{}:{}:00000001:{}:{}:{}",
                    ha1, challenge.nonce, cnonce, qop, ha2
                ))
            );
            format!(
                r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}", qop={}, nc=00000001, cnonce="{}""#,
                username, challenge.realm, challenge.nonce, uri, response, qop, cnonce
            )
        }
        None => {
            let response = format!(
                "{:x}",
                md5::compute(format!("{}:{}:{}", ha1, challenge.nonce, ha2))
            );
            format!(
                r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
                username, challenge.realm, challenge.nonce, uri, response
            )
        }
    }
}

// ============================================================================
// Test/Mock implementation
// ============================================================================

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Mock HTTP client for testing.
///
/// Responses are keyed by `"{METHOD} {url}"` and returned in FIFO order.
/// A standing default response covers every unmatched attempt, which is the
/// normal shape of a brute-force run: most attempts hit the same rejection.
#[derive(Clone)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, Vec<MockResponse>>>>,
    default_response: Arc<Mutex<Option<HttpResponse>>>,
    calls: Arc<Mutex<Vec<ProbeRequest>>>,
    in_flight: Arc<AtomicUsize>,
}

/// A mock response that can optionally wait for a trigger before completing.
enum MockResponse {
    /// Immediate response
    Immediate(Result<HttpResponse>),
    /// Response that waits for a trigger signal before completing
    Triggered {
        response: Result<HttpResponse>,
        trigger: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
    },
}

impl MockHttpClient {
    /// Create a new mock HTTP client with no configured responses.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a predetermined response for a specific method and URL.
    ///
    /// The key is formatted as `"{METHOD} {url}"`. Multiple responses can be
    /// added for the same key; they are returned in FIFO order.
    pub fn add_response(&self, key: &str, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(MockResponse::Immediate(response));
    }

    /// Set the response returned for attempts with no keyed response.
    pub fn set_default_response(&self, response: HttpResponse) {
        *self.default_response.lock() = Some(response);
    }

    /// Add a response that waits for a manual trigger before completing.
    ///
    /// Returns a sender; sending `()` (or dropping it) lets the held attempt
    /// complete. Used to pin a worker mid-request in cancellation tests.
    pub fn add_response_with_trigger(
        &self,
        key: &str,
        response: Result<HttpResponse>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(MockResponse::Triggered {
                response,
                trigger: Arc::new(Mutex::new(Some(rx))),
            });
        tx
    }

    /// Get all attempts that have been sent through this mock client.
    pub fn get_calls(&self) -> Vec<ProbeRequest> {
        self.calls.lock().clone()
    }

    /// Clear all recorded attempts.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of attempts sent so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of attempts currently in flight. Useful for cancellation tests:
    /// an abandoned attempt decrements this on drop.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: &ProbeRequest, _timeout_ms: u64) -> Result<HttpResponse> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        // Decrement even if the holding task is cancelled.
        let in_flight = self.in_flight.clone();
        let _guard = scopeguard::guard((), move |_| {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        self.calls.lock().push(request.clone());

        let key = format!("{} {}", request.method, request.url);
        let mock_response = {
            let mut responses = self.responses.lock();
            match responses.get_mut(&key) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        match mock_response {
            Some(MockResponse::Immediate(response)) => response,
            Some(MockResponse::Triggered { response, trigger }) => {
                let rx = trigger.lock().take();
                if let Some(rx) = rx {
                    // Proceed regardless of whether the sender fired or dropped.
                    let _ = rx.await;
                }
                response
            }
            None => match self.default_response.lock().clone() {
                Some(response) => Ok(response),
                None => Err(PicklockError::Other(anyhow::anyhow!(
                    "No mock response configured for {} {}",
                    request.method,
                    request.url
                ))),
            },
        }
    }
}
