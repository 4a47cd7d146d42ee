//! Run configuration: the immutable snapshot of everything a run needs.
//!
//! The legacy tool this engine replaces kept its CLI arguments in a
//! process-wide mutable dictionary. Here the resolved configuration is built
//! once, validated up front, and passed by `Arc` into the coordinator and
//! workers; nothing reads ambient global state during a run.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::classify::MatchRule;
use crate::error::{PicklockError, Result};

/// Default User-Agent sent with every attempt unless overridden.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// HTTP method for attempts. The engine only issues credential probes, so the
/// surface is deliberately small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = PicklockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(PicklockError::Config(format!(
                "{other} is not a valid request type"
            ))),
        }
    }
}

/// How each attempt is signed with the candidate credentials.
///
/// `None` means the credentials only appear through template substitution.
/// The other schemes leave the target URL untouched and sign the request
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AuthStrategy {
    #[default]
    None,
    Basic,
    Digest,
    /// Accepted at the type level for parity with the legacy tool, but
    /// rejected during validation: NTLM needs a connection-level handshake
    /// this client does not implement.
    Ntlm,
}

impl AuthStrategy {
    pub fn is_none(&self) -> bool {
        matches!(self, AuthStrategy::None)
    }
}

/// Immutable snapshot of a resolved run. Created once at startup, read-only
/// for the lifetime of the run.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Target URL, possibly containing `{{Username}}`/`{{Password}}`
    /// placeholders when no auth strategy is active.
    pub target: String,
    pub method: HttpMethod,
    /// POST body template, resolved per attempt.
    pub body: Option<String>,
    /// Resolved header map; defaults already applied, user headers win.
    pub headers: HashMap<String, String>,
    /// Proxy URL, passed through to the HTTP layer.
    pub proxy: Option<String>,
    pub auth: AuthStrategy,
    /// Requested worker count. The partitioner may run fewer when the shard
    /// arithmetic produces fewer windows (see `partition`).
    pub threads: usize,
    pub rule: MatchRule,
    pub timeout_ms: u64,
    pub usernames: Vec<String>,
    pub passwords: Vec<String>,
}

impl RunConfig {
    /// Validate the whole snapshot. Every problem here is fatal before any
    /// work starts.
    pub fn validate(&self) -> Result<()> {
        if self.usernames.is_empty() {
            return Err(PicklockError::Config("username list is empty".into()));
        }
        if self.passwords.is_empty() {
            return Err(PicklockError::Config("password list is empty".into()));
        }
        if self.threads == 0 {
            return Err(PicklockError::Config(
                "thread count must be at least 1".into(),
            ));
        }
        if self.threads > self.passwords.len() {
            return Err(PicklockError::Config(
                "too many workers for password count".into(),
            ));
        }
        validate_url(&self.target, "url")?;
        if let Some(proxy) = &self.proxy {
            validate_url(proxy, "proxy")?;
        }
        if matches!(self.auth, AuthStrategy::Ntlm) {
            return Err(PicklockError::Config(
                "NTLM authentication is not supported by this client".into(),
            ));
        }
        Ok(())
    }

    /// True when the resolved Content-Type marks the body as JSON, in which
    /// case the resolved body text gets wrapped as a JSON string value.
    pub fn json_body(&self) -> bool {
        self.headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v.to_lowercase().contains("json"))
    }
}

fn validate_url(input: &str, what: &str) -> Result<()> {
    let parsed = Url::parse(input)
        .map_err(|_| PicklockError::Config(format!("{input} is not a valid {what}")))?;
    if parsed.host_str().is_none() {
        return Err(PicklockError::Config(format!(
            "{input} is not a valid {what}"
        )));
    }
    Ok(())
}

/// Build the effective header map: engine defaults first, then user headers
/// on top.
pub fn resolve_headers(
    method: HttpMethod,
    user_headers: &[String],
) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
    if method == HttpMethod::Post {
        headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
    }
    for raw in user_headers {
        let (key, value) = parse_header(raw)?;
        headers.insert(key, value);
    }
    Ok(headers)
}

/// Parse a `Key: value` header argument. Everything after the first colon is
/// the value, with colons inside it preserved.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let mut parts = raw.splitn(2, ':');
    let key = parts.next().unwrap_or("").trim();
    let value = parts.next().unwrap_or("").trim();
    if key.is_empty() || value.is_empty() {
        return Err(PicklockError::Config(format!(
            "\"{raw}\" is not a valid header"
        )));
    }
    Ok((key.to_string(), value.to_string()))
}
