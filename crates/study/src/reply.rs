use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?\s*```\s*$").expect("fence regex")
});

/// Removes one Markdown code fence wrapping the whole reply, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    match FENCE_RE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => raw.trim(),
    }
}

/// Parses a model reply that should be one JSON object. Tolerates a code
/// fence and prose around the outermost braces.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T> {
    let body = strip_code_fence(raw);
    if let Ok(value) = serde_json::from_str(body) {
        return Ok(value);
    }
    let start = body.find('{');
    let end = body.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end])
            .with_context(|| format!("{what} reply is not valid JSON")),
        _ => Err(anyhow!(format!("{what} reply contains no JSON object"))),
    }
}
