//! Orchestrator configuration.

use pha_core::config::{
    HISTORY_WINDOW_ENV, LIST_CAPACITY_ENV, MAX_GATEWAY_CALLS_ENV, PROMPT_HISTORY_TURNS_ENV,
};
use pha_core::{env_or, ConfigError};
use pha_memory::{MemoryLimits, DEFAULT_HISTORY_WINDOW, DEFAULT_LIST_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

/// Default gateway call budget per traversal.
pub const DEFAULT_MAX_GATEWAY_CALLS: usize = 10;

/// Default number of history turns rendered into the planning prompt.
pub const DEFAULT_PROMPT_HISTORY_TURNS: usize = 5;

/// Calls made by the smallest traversal that can fall back safely: plan,
/// two analytical stages, reflection, memory update.
pub const MIN_TRAVERSAL_CALLS: usize = 5;

/// Tunables for one orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Conversation turns kept in memory.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Capacity of the bounded memory lists.
    #[serde(default = "default_list_capacity")]
    pub list_capacity: usize,

    /// Gateway calls allowed per traversal.
    #[serde(default = "default_max_gateway_calls")]
    pub max_gateway_calls_per_turn: usize,

    /// History turns rendered into the Step 1 prompt.
    #[serde(default = "default_prompt_history_turns")]
    pub prompt_history_turns: usize,
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

fn default_list_capacity() -> usize {
    DEFAULT_LIST_CAPACITY
}

fn default_max_gateway_calls() -> usize {
    DEFAULT_MAX_GATEWAY_CALLS
}

fn default_prompt_history_turns() -> usize {
    DEFAULT_PROMPT_HISTORY_TURNS
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            list_capacity: DEFAULT_LIST_CAPACITY,
            max_gateway_calls_per_turn: DEFAULT_MAX_GATEWAY_CALLS,
            prompt_history_turns: DEFAULT_PROMPT_HISTORY_TURNS,
        }
    }
}

impl OrchestratorConfig {
    /// Read overrides from the environment.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            history_window: env_or(HISTORY_WINDOW_ENV, DEFAULT_HISTORY_WINDOW)?,
            list_capacity: env_or(LIST_CAPACITY_ENV, DEFAULT_LIST_CAPACITY)?,
            max_gateway_calls_per_turn: env_or(MAX_GATEWAY_CALLS_ENV, DEFAULT_MAX_GATEWAY_CALLS)?,
            prompt_history_turns: env_or(PROMPT_HISTORY_TURNS_ENV, DEFAULT_PROMPT_HISTORY_TURNS)?,
        })
    }

    pub fn with_max_gateway_calls(mut self, calls: usize) -> Self {
        self.max_gateway_calls_per_turn = calls;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn with_list_capacity(mut self, capacity: usize) -> Self {
        self.list_capacity = capacity;
        self
    }

    pub fn memory_limits(&self) -> MemoryLimits {
        MemoryLimits {
            list_capacity: self.list_capacity,
            history_window: self.history_window,
        }
    }

    /// Reject zero windows and budgets too small for a minimal traversal.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("history_window", self.history_window),
            ("list_capacity", self.list_capacity),
            ("prompt_history_turns", self.prompt_history_turns),
        ] {
            if value == 0 {
                return Err(OrchestratorError::Configuration(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if self.max_gateway_calls_per_turn < MIN_TRAVERSAL_CALLS {
            return Err(OrchestratorError::Configuration(format!(
                "max_gateway_calls_per_turn must be at least {MIN_TRAVERSAL_CALLS}, got {}",
                self.max_gateway_calls_per_turn
            )));
        }
        Ok(())
    }
}
