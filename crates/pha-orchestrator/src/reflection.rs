//! The Step 3 quality check.

use pha_core::{parse_json, ParseError};
use serde::Serialize;
use serde_json::Value;

/// Where a reflection came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReflectionOrigin {
    Parsed,
    /// The reflection call failed or returned something unusable.
    Unavailable { reason: String },
}

/// Which text became the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// The proposed answer was approved.
    Approved,
    /// The reflection replaced it with a revision.
    Revised,
    /// Not approved and no revision; the proposed answer is kept.
    Unrevised,
    /// No usable reflection; the proposed answer is kept.
    Unreviewed,
}

/// Outcome of reviewing the proposed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflectionResult {
    /// The proposed answer can be shown as is.
    pub approved: bool,
    /// Problems the review found, possibly empty.
    pub issues: Vec<String>,
    /// Replacement answer; never an empty string.
    pub revised_content: Option<String>,
    /// Improvement advice given without a full revision.
    pub suggestions: Option<String>,
    /// Whether the review was parsed or unavailable.
    pub origin: ReflectionOrigin,
}

impl ReflectionResult {
    /// An unapproved result carrying why no review happened.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            issues: Vec::new(),
            revised_content: None,
            suggestions: None,
            origin: ReflectionOrigin::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: Value = parse_json(text)?;
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::Invalid("reflection is not a JSON object".into()))?;

        let approved = match object.get("approved") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => return Err(ParseError::Invalid("reflection has no approved flag".into())),
        };

        let issues = match object.get("issues") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        };

        Ok(Self {
            approved,
            issues,
            revised_content: optional_text(object.get("revised_content")),
            suggestions: optional_text(
                object
                    .get("suggestions")
                    .or_else(|| object.get("suggested_improvements")),
            ),
            origin: ReflectionOrigin::Parsed,
        })
    }

    /// Parse model output; unusable output becomes [`Self::unavailable`].
    pub fn from_model_output(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|e| Self::unavailable(e.to_string()))
    }

    /// Choose the final answer. The proposed answer is never discarded
    /// unless a non-empty revision replaces it.
    pub fn resolve(&self, proposed: &str) -> (String, AnswerSource) {
        match (&self.origin, self.approved, &self.revised_content) {
            (ReflectionOrigin::Unavailable { .. }, _, _) => {
                (proposed.to_string(), AnswerSource::Unreviewed)
            }
            (ReflectionOrigin::Parsed, true, _) => (proposed.to_string(), AnswerSource::Approved),
            (ReflectionOrigin::Parsed, false, Some(revision)) => {
                (revision.clone(), AnswerSource::Revised)
            }
            (ReflectionOrigin::Parsed, false, None) => {
                (proposed.to_string(), AnswerSource::Unrevised)
            }
        }
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
