//! The extraction record produced by the memory-update step.
//!
//! Models are loose with types, so parsing is lenient: missing keys and
//! `null` become empty, scalars in lists are stringified, and a bare string
//! where a list is expected counts as a one-item list.

use std::collections::BTreeMap;

use pha_core::{parse_json, ParseError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Entities extracted from one conversation turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUpdate {
    pub goals: Vec<String>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub lifestyle: BTreeMap<String, String>,
    pub key_metrics: Vec<String>,
    pub action_items: Vec<String>,
    pub progress_notes: Vec<String>,
}

impl MemoryUpdate {
    /// Parse model output into an update.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: Value = parse_json(text)?;
        Self::from_value(&value)
    }

    /// Build an update from an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::Invalid("memory update is not a JSON object".into()))?;

        Ok(Self {
            goals: string_list(object, "goals"),
            conditions: string_list(object, "conditions"),
            medications: string_list(object, "medications"),
            lifestyle: string_map(object, "lifestyle"),
            key_metrics: string_list(object, "key_metrics"),
            action_items: string_list(object, "action_items"),
            progress_notes: string_list(object, "progress_notes"),
        })
    }

    /// True when nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
            && self.conditions.is_empty()
            && self.medications.is_empty()
            && self.lifestyle.is_empty()
            && self.key_metrics.is_empty()
            && self.action_items.is_empty()
            && self.progress_notes.is_empty()
    }

    /// Total number of extracted items across all fields.
    pub fn item_count(&self) -> usize {
        self.goals.len()
            + self.conditions.len()
            + self.medications.len()
            + self.lifestyle.len()
            + self.key_metrics.len()
            + self.action_items.len()
            + self.progress_notes.len()
    }
}

/// What happened to memory at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeStatus {
    /// The extraction was merged; `changed` entries were added or overwritten.
    Merged { changed: usize },
    /// The extraction could not be used. The turn was still recorded.
    Skipped { reason: String },
}

impl MergeStatus {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

impl std::fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged { changed } => write!(f, "merged ({changed} changes)"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

fn stringify(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
        Some(value @ Value::String(_)) => stringify(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn string_map(object: &Map<String, Value>, key: &str) -> BTreeMap<String, String> {
    match object.get(key) {
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(k, v)| stringify(v).map(|v| (k.trim().to_string(), v)))
            .filter(|(k, _)| !k.is_empty())
            .collect(),
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_update() {
        let text = r#"```json
{
  "goals": ["Improve sleep quality"],
  "conditions": [],
  "medications": ["Vitamin D3"],
  "lifestyle": {"exercise": "runs twice a week"},
  "key_metrics": ["avg sleep 6.8h"],
  "action_items": ["No screens after 22:00"],
  "progress_notes": ["Asked about sleep"]
}
```"#;
        let update = MemoryUpdate::parse(text).unwrap();
        assert_eq!(update.goals, vec!["Improve sleep quality"]);
        assert_eq!(update.lifestyle["exercise"], "runs twice a week");
        assert_eq!(update.item_count(), 6);
    }

    #[test]
    fn test_lenient_types() {
        let text = r#"{
  "goals": "Lose 10 pounds",
  "conditions": null,
  "key_metrics": [72, {"hrv": 45}, null, "  "],
  "lifestyle": {"sleep_hours": 7, "diet": null}
}"#;
        let update = MemoryUpdate::parse(text).unwrap();
        assert_eq!(update.goals, vec!["Lose 10 pounds"]);
        assert!(update.conditions.is_empty());
        assert_eq!(update.key_metrics, vec!["72", "{\"hrv\":45}"]);
        assert_eq!(update.lifestyle.len(), 1);
        assert_eq!(update.lifestyle["sleep_hours"], "7");
        assert!(update.medications.is_empty());
    }

    #[test]
    fn test_empty_object() {
        let update = MemoryUpdate::parse("{}").unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_rejects_prose() {
        assert_eq!(
            MemoryUpdate::parse("Nothing worth remembering."),
            Err(ParseError::NoJson)
        );
    }

    #[test]
    fn test_rejects_non_object() {
        let value = serde_json::json!(["a", "b"]);
        assert!(matches!(
            MemoryUpdate::from_value(&value),
            Err(ParseError::Invalid(_))
        ));
    }
}
