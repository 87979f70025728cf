//! Per-agent conversation log.
//!
//! Each specialist keeps every exchange it has made. The log itself is
//! unbounded; only the rendered form used in prompts is windowed.

use chrono::{DateTime, Utc};
use pha_memory::NO_HISTORY;
use serde::{Deserialize, Serialize};

/// One call made by an agent: what it was asked and what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// Operation that produced the exchange.
    pub operation: String,

    /// Input text worth remembering (usually the user's query).
    pub input: String,

    /// Generated text.
    pub output: String,

    /// When the exchange finished.
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(
        operation: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            input: input.into(),
            output: output.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered log of an agent's exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    window: usize,
    speaker: String,
    exchanges: Vec<Exchange>,
}

impl ConversationLog {
    /// Create an empty log that renders at most `window` exchanges, labelling
    /// generated text with `speaker`.
    pub fn new(window: usize, speaker: impl Into<String>) -> Self {
        Self {
            window: window.max(1),
            speaker: speaker.into(),
            exchanges: Vec::new(),
        }
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    /// The windowed exchanges, oldest first.
    pub fn recent(&self) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(self.window);
        &self.exchanges[start..]
    }

    /// Render the window for a prompt.
    pub fn render(&self) -> String {
        let recent = self.recent();
        if recent.is_empty() {
            return NO_HISTORY.to_string();
        }
        recent
            .iter()
            .map(|e| format!("User: {}\n\n{}: {}", e.input, self.speaker, e.output))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
