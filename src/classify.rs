//! Attempt classification: success or failure from an HTTP response.

use serde::Serialize;

/// How a run decides that a credential pair worked. Exactly one rule is
/// active per run; mutual exclusivity is enforced upstream by configuration,
/// not re-checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MatchRule {
    /// Match iff the response status code is in the set.
    ExpectedCodes(Vec<u16>),
    /// Match iff the body contains the substring.
    ExpectedBodyContains(String),
    /// Match iff the body does NOT contain the substring.
    ExpectedBodyNotContains(String),
}

/// Outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Match,
    NoMatch,
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match)
    }
}

impl MatchRule {
    /// Classify a response against this rule.
    pub fn classify(&self, status: u16, body: &str) -> Outcome {
        let matched = match self {
            MatchRule::ExpectedCodes(codes) => codes.contains(&status),
            MatchRule::ExpectedBodyContains(needle) => body.contains(needle.as_str()),
            MatchRule::ExpectedBodyNotContains(needle) => !body.contains(needle.as_str()),
        };
        if matched {
            Outcome::Match
        } else {
            Outcome::NoMatch
        }
    }
}
