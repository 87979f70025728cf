//! Defensive JSON extraction from model output.
//!
//! Models wrap structured answers in prose or markdown fences. Candidates are
//! tried in order: a ```` ```json ```` fence, any fence, the outermost `{...}`
//! span, then the whole text.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ParseError;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Body of the first fence opened by `opener`, or the remainder if unclosed.
fn fenced<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let body = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    let body = body.trim();
    (!body.is_empty()).then_some(body)
}

/// Outermost `{ ... }` span.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn candidates(text: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(4);
    let found = [
        fenced(text, JSON_FENCE),
        fenced(text, FENCE),
        brace_span(text),
        Some(text.trim()).filter(|t| !t.is_empty()),
    ];
    for candidate in found.into_iter().flatten() {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Locate the most likely JSON object in `text` without parsing it.
pub fn extract_json_block(text: &str) -> Option<&str> {
    candidates(text)
        .into_iter()
        .find(|c| c.trim_start().starts_with('{'))
        .or_else(|| brace_span(text))
}

/// Parse the first candidate that deserializes into `T`.
///
/// Returns [`ParseError::NoJson`] when the text contains no object at all,
/// otherwise the error of the first candidate tried.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    if !text.contains('{') {
        return Err(ParseError::NoJson);
    }

    let mut first_error = None;
    for candidate in candidates(text) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert_with(|| ParseError::Invalid(e.to_string()));
            }
        }
    }
    Err(first_error.unwrap_or(ParseError::NoJson))
}

/// Pretty-print a value for prompt context, `{}` if serialization fails.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
