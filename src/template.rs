//! URL and body template resolution.
//!
//! Templates carry `{{Username}}` and `{{Password}}` placeholders, optionally
//! with a single space inside the braces (`{{ Username }}`), matching the
//! legacy tool's delimiter dialect. Substitution is literal text
//! replacement: candidate values are not escaped into the template, so
//! injection via crafted usernames is a documented risk of the tool, not a
//! defect here.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s?(Username|Password)\s?\}\}").expect("static regex"))
}

/// Resolve a template against a candidate credential pair.
///
/// Unknown placeholders are left untouched.
pub fn resolve(template: &str, username: &str, password: &str) -> String {
    placeholder()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match caps.get(1).map(|m| m.as_str()) {
                Some("Username") => username.to_string(),
                Some("Password") => password.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolve a body template. When the run's Content-Type is JSON the resolved
/// text is wrapped as a JSON string value; the template is never parsed as
/// JSON itself.
pub fn resolve_body(template: &str, username: &str, password: &str, json: bool) -> Result<String> {
    let resolved = resolve(template, username, password);
    if json {
        Ok(serde_json::to_string(&resolved)?)
    } else {
        Ok(resolved)
    }
}
