//! Conversational memory for the Personal Health Agent.
//!
//! [`Memory`] is the per-session record of goals, conditions, medications,
//! lifestyle facts, bounded note lists, and a bounded conversation history.
//! [`MemoryUpdate`] is the lenient extraction record merged into it after
//! every turn.
//!
//! # Example
//!
//! ```
//! use pha_memory::{Memory, MemoryUpdate};
//!
//! let memory = Memory::default();
//! let update = MemoryUpdate::parse(r#"{"goals": ["Sleep 8 hours"]}"#).unwrap();
//! let next = memory.merged(&update);
//!
//! assert!(memory.goals().is_empty());
//! assert_eq!(next.goals(), &["Sleep 8 hours"]);
//! ```

pub mod collections;
pub mod memory;
pub mod update;

pub use collections::{BoundedList, OrderedSet};
pub use memory::{
    ConversationTurn, Memory, MemoryLimits, DEFAULT_HISTORY_WINDOW, DEFAULT_LIST_CAPACITY,
    NO_HISTORY,
};
pub use update::{MemoryUpdate, MergeStatus};
