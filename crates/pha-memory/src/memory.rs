//! Conversational memory for one session.
//!
//! Entity sets only grow, the lifestyle map overwrites per key, and the
//! bounded lists and history evict their oldest entries. Merging an
//! extraction is pure ([`Memory::merged`]); [`Memory::apply`] is the in-place
//! form used by the orchestrator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pha_core::to_pretty_json;
use serde::Serialize;
use tracing::debug;

use crate::collections::{BoundedList, OrderedSet};
use crate::update::MemoryUpdate;

/// Default capacity of `key_metrics`, `action_items` and `progress_notes`.
pub const DEFAULT_LIST_CAPACITY: usize = 20;

/// Default number of conversation turns kept.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Shown in prompts when no turn has been recorded yet.
pub const NO_HISTORY: &str = "No previous conversation";

/// Capacities applied to the bounded parts of [`Memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryLimits {
    pub list_capacity: usize,
    pub history_window: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            list_capacity: DEFAULT_LIST_CAPACITY,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// One user query and the answer given to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    /// 1-based, strictly increasing across the session.
    pub turn_index: u64,
    pub user_text: String,
    pub assistant_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Entity fields rendered into prompts, without the history.
#[derive(Serialize)]
struct EntityView<'a> {
    goals: &'a OrderedSet,
    conditions: &'a OrderedSet,
    lifestyle: &'a BTreeMap<String, String>,
    medications: &'a OrderedSet,
    key_metrics: &'a BoundedList<String>,
    action_items: &'a BoundedList<String>,
    progress_notes: &'a BoundedList<String>,
}

/// Session memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memory {
    limits: MemoryLimits,
    goals: OrderedSet,
    conditions: OrderedSet,
    medications: OrderedSet,
    lifestyle: BTreeMap<String, String>,
    key_metrics: BoundedList<String>,
    action_items: BoundedList<String>,
    progress_notes: BoundedList<String>,
    history: BoundedList<ConversationTurn>,
    next_turn_index: u64,
}

impl Memory {
    /// Create an empty memory.
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            limits,
            goals: OrderedSet::new(),
            conditions: OrderedSet::new(),
            medications: OrderedSet::new(),
            lifestyle: BTreeMap::new(),
            key_metrics: BoundedList::new(limits.list_capacity),
            action_items: BoundedList::new(limits.list_capacity),
            progress_notes: BoundedList::new(limits.list_capacity),
            history: BoundedList::new(limits.history_window),
            next_turn_index: 1,
        }
    }

    /// Create a memory pre-populated with known conditions and medications.
    pub fn seeded<C, M>(limits: MemoryLimits, conditions: C, medications: M) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let mut memory = Self::new(limits);
        memory.conditions = conditions.into_iter().collect();
        memory.medications = medications.into_iter().collect();
        memory
    }

    /// Return a new memory with `update` merged in; `self` is untouched.
    pub fn merged(&self, update: &MemoryUpdate) -> Memory {
        let mut next = self.clone();
        next.apply(update);
        next
    }

    /// Merge `update` in place. Returns the number of entries added or changed.
    pub fn apply(&mut self, update: &MemoryUpdate) -> usize {
        let mut changed = 0;

        for (set, items) in [
            (&mut self.goals, &update.goals),
            (&mut self.conditions, &update.conditions),
            (&mut self.medications, &update.medications),
        ] {
            for item in items {
                if set.insert(item) {
                    changed += 1;
                }
            }
        }

        for (key, value) in &update.lifestyle {
            if self.lifestyle.get(key) != Some(value) {
                self.lifestyle.insert(key.clone(), value.clone());
                changed += 1;
            }
        }

        for (list, items) in [
            (&mut self.key_metrics, &update.key_metrics),
            (&mut self.action_items, &update.action_items),
            (&mut self.progress_notes, &update.progress_notes),
        ] {
            for item in items {
                if list.push_unique(item.clone()) {
                    changed += 1;
                }
            }
        }

        debug!(changed, "Merged memory update");
        changed
    }

    /// Append a turn to the history and return its index.
    pub fn record_turn(
        &mut self,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
    ) -> u64 {
        let turn_index = self.next_turn_index;
        self.next_turn_index += 1;
        self.history.push(ConversationTurn {
            turn_index,
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            timestamp: Utc::now(),
        });
        turn_index
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    pub fn goals(&self) -> &[String] {
        self.goals.as_slice()
    }

    pub fn conditions(&self) -> &[String] {
        self.conditions.as_slice()
    }

    pub fn medications(&self) -> &[String] {
        self.medications.as_slice()
    }

    pub fn lifestyle(&self) -> &BTreeMap<String, String> {
        &self.lifestyle
    }

    pub fn key_metrics(&self) -> Vec<String> {
        self.key_metrics.to_vec()
    }

    pub fn action_items(&self) -> Vec<String> {
        self.action_items.to_vec()
    }

    pub fn progress_notes(&self) -> Vec<String> {
        self.progress_notes.to_vec()
    }

    /// Retained turns, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &ConversationTurn> + ExactSizeIterator {
        self.history.iter()
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> Vec<&ConversationTurn> {
        self.history.last_n(n).collect()
    }

    /// Turns recorded over the whole session, including evicted ones.
    pub fn total_turns(&self) -> u64 {
        self.next_turn_index - 1
    }

    pub fn next_turn_index(&self) -> u64 {
        self.next_turn_index
    }

    /// True when no entity has been recorded. History is not considered.
    pub fn has_no_entities(&self) -> bool {
        self.goals.is_empty()
            && self.conditions.is_empty()
            && self.medications.is_empty()
            && self.lifestyle.is_empty()
            && self.key_metrics.is_empty()
            && self.action_items.is_empty()
            && self.progress_notes.is_empty()
    }

    /// Pretty JSON of the entity fields, as rendered into prompts.
    pub fn entities_json(&self) -> String {
        to_pretty_json(&EntityView {
            goals: &self.goals,
            conditions: &self.conditions,
            lifestyle: &self.lifestyle,
            medications: &self.medications,
            key_metrics: &self.key_metrics,
            action_items: &self.action_items,
            progress_notes: &self.progress_notes,
        })
    }

    /// The last `max_turns` turns as `User:` / `Assistant:` lines.
    pub fn format_history(&self, max_turns: usize) -> String {
        let turns = self.recent_turns(max_turns);
        if turns.is_empty() {
            return NO_HISTORY.to_string();
        }
        turns
            .iter()
            .map(|t| format!("User: {}\n\nAssistant: {}", t.user_text, t.assistant_text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MemoryLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_with_goal(goal: &str) -> MemoryUpdate {
        MemoryUpdate {
            goals: vec![goal.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_new_memory_is_empty() {
        let memory = Memory::default();
        assert!(memory.has_no_entities());
        assert_eq!(memory.total_turns(), 0);
        assert_eq!(memory.next_turn_index(), 1);
        assert_eq!(memory.format_history(5), NO_HISTORY);
    }

    #[test]
    fn test_seeded() {
        let memory = Memory::seeded(
            MemoryLimits::default(),
            ["Pre-hypertension"],
            vec!["Vitamin D3".to_string()],
        );
        assert_eq!(memory.conditions(), &["Pre-hypertension"]);
        assert_eq!(memory.medications(), &["Vitamin D3"]);
        assert!(memory.goals().is_empty());
    }

    #[test]
    fn test_merged_is_pure() {
        let base = Memory::default().merged(&update_with_goal("Sleep 8 hours"));
        let update = MemoryUpdate {
            goals: vec!["Walk daily".into()],
            lifestyle: BTreeMap::from([("diet".to_string(), "vegetarian".to_string())]),
            action_items: vec!["Log meals".into()],
            ..Default::default()
        };

        let snapshot = base.clone();
        let first = base.merged(&update);
        let second = base.merged(&update);

        assert_eq!(base, snapshot);
        assert_eq!(first, second);
        assert_eq!(first.goals(), &["Sleep 8 hours", "Walk daily"]);
    }

    #[test]
    fn test_sets_never_shrink() {
        let mut memory = Memory::default();
        memory.apply(&MemoryUpdate {
            goals: vec!["Lower LDL".into()],
            conditions: vec!["Pre-hypertension".into()],
            medications: vec!["Vitamin D3".into()],
            ..Default::default()
        });

        // An extraction that omits everything must not remove anything.
        memory.apply(&MemoryUpdate::default());
        memory.apply(&update_with_goal("Lower LDL"));

        assert_eq!(memory.goals(), &["Lower LDL"]);
        assert_eq!(memory.conditions(), &["Pre-hypertension"]);
        assert_eq!(memory.medications(), &["Vitamin D3"]);
    }

    #[test]
    fn test_lifestyle_last_write_wins() {
        let mut memory = Memory::default();
        let first = MemoryUpdate {
            lifestyle: BTreeMap::from([
                ("exercise".to_string(), "none".to_string()),
                ("diet".to_string(), "mixed".to_string()),
            ]),
            ..Default::default()
        };
        let second = MemoryUpdate {
            lifestyle: BTreeMap::from([("exercise".to_string(), "runs 3x/week".to_string())]),
            ..Default::default()
        };
        memory.apply(&first);
        assert_eq!(memory.apply(&second), 1);

        assert_eq!(memory.lifestyle()["exercise"], "runs 3x/week");
        assert_eq!(memory.lifestyle()["diet"], "mixed");
    }

    #[test]
    fn test_bounded_lists_skip_duplicates_and_evict() {
        let limits = MemoryLimits {
            list_capacity: 3,
            history_window: 10,
        };
        let mut memory = Memory::new(limits);
        memory.apply(&MemoryUpdate {
            action_items: vec!["a".into(), "b".into(), "a".into()],
            ..Default::default()
        });
        assert_eq!(memory.action_items(), vec!["a", "b"]);

        memory.apply(&MemoryUpdate {
            action_items: vec!["c".into(), "d".into()],
            ..Default::default()
        });
        assert_eq!(memory.action_items(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_history_window_keeps_latest_turns() {
        let mut memory = Memory::default();
        for i in 1..=12 {
            let index = memory.record_turn(format!("q{i}"), format!("a{i}"));
            assert_eq!(index, i);
        }

        let indices: Vec<u64> = memory.history().map(|t| t.turn_index).collect();
        assert_eq!(indices, (3..=12).collect::<Vec<_>>());
        assert_eq!(memory.total_turns(), 12);
        assert_eq!(memory.history().next().map(|t| t.user_text.as_str()), Some("q3"));
    }

    #[test]
    fn test_format_history() {
        let mut memory = Memory::default();
        memory.record_turn("How did I sleep?", "About 7 hours.");
        memory.record_turn("And HRV?", "Stable.");

        let text = memory.format_history(1);
        assert_eq!(text, "User: And HRV?\n\nAssistant: Stable.");
    }

    #[test]
    fn test_entities_json_excludes_history() {
        let mut memory = Memory::default().merged(&update_with_goal("Sleep better"));
        memory.record_turn("secret question", "answer");

        let json = memory.entities_json();
        assert!(json.contains("Sleep better"));
        assert!(json.contains("progress_notes"));
        assert!(!json.contains("secret question"));
    }
}
