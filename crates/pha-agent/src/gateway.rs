//! The LLM gateway seam.
//!
//! Every model call in the system goes through [`Gateway::complete`]. Concrete
//! HTTP clients live in [`crate::client`]; [`MeteredGateway`] wraps any of them
//! to count calls and enforce a per-traversal budget.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::GatewayError;

/// One completion call: a role instruction plus a task instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Standing instruction describing who the model is acting as.
    pub role_instruction: String,
    /// The concrete task for this call.
    pub task_instruction: String,
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,
    /// Output token cap, at least 1.
    pub max_output_tokens: u32,
}

impl CompletionRequest {
    pub fn new(role_instruction: impl Into<String>, task_instruction: impl Into<String>) -> Self {
        Self {
            role_instruction: role_instruction.into(),
            task_instruction: task_instruction.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the temperature, clamped to `[0, 1]`. NaN falls back to the default.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(0.0, 1.0)
        };
        self
    }

    /// Set the output token cap, raised to 1 if zero.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens.max(1);
        self
    }

    /// Role and task folded into a single prompt for backends without a
    /// separate system channel.
    pub fn combined_prompt(&self) -> String {
        format!(
            "{}\n\n---\n\nUser Query: {}",
            self.role_instruction, self.task_instruction
        )
    }

    /// Total prompt length in bytes.
    pub fn prompt_len(&self) -> usize {
        self.role_instruction.len() + self.task_instruction.len()
    }
}

/// A text-completion backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;

    /// Identifier of the model behind this gateway.
    fn model_id(&self) -> &str;
}

/// Shared handle used by every agent of a session.
pub type SharedGateway = Arc<dyn Gateway>;

/// Counts calls to an inner gateway and optionally caps them.
///
/// The counter includes attempted calls that failed. Calls refused because
/// the budget is exhausted are not forwarded and not counted.
pub struct MeteredGateway {
    inner: SharedGateway,
    calls: AtomicUsize,
    budget: Option<usize>,
}

impl MeteredGateway {
    /// Wrap `inner` without a budget.
    pub fn new(inner: SharedGateway) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            budget: None,
        }
    }

    /// Wrap `inner` with an optional call budget.
    pub fn with_budget(inner: SharedGateway, budget: Option<usize>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            budget,
        }
    }

    /// Calls forwarded since the last reset.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn budget(&self) -> Option<usize> {
        self.budget
    }

    /// Calls still allowed, `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        self.budget.map(|b| b.saturating_sub(self.calls()))
    }

    /// Zero the counter, typically at the start of a traversal.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    fn reserve(&self) -> Result<usize, GatewayError> {
        let limit = self.budget;
        self.calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match limit {
                Some(limit) if n >= limit => None,
                _ => Some(n + 1),
            })
            .map(|previous| previous + 1)
            .map_err(|_| GatewayError::BudgetExhausted {
                limit: limit.unwrap_or_default(),
            })
    }
}

#[async_trait]
impl Gateway for MeteredGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let call = match self.reserve() {
            Ok(call) => call,
            Err(e) => {
                warn!(budget = ?self.budget, "Refusing gateway call: {}", e);
                return Err(e);
            }
        };
        debug!(call, temperature = request.temperature, "Forwarding gateway call");
        self.inner.complete(request).await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
