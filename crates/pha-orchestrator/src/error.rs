//! Error types for the orchestrator.

use pha_agent::{AgentError, GatewayError, TemplateError};
use pha_core::ConfigError;
use thiserror::Error;

/// Failures that end a traversal.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The Step 1 gateway call failed.
    #[error("Understanding the request failed: {0}")]
    Understanding(#[source] GatewayError),

    /// The main agent could not produce an answer.
    #[error("Main agent failed: {0}")]
    MainAgent(#[source] AgentError),

    /// The Step 4 gateway call failed. The answer was produced but memory was
    /// not updated.
    #[error("Memory update failed: {source}")]
    MemoryUpdate {
        /// The answer that would have been returned.
        final_answer: String,
        #[source]
        source: GatewayError,
    },

    /// Prompt rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl OrchestratorError {
    /// The answer that was produced before the failure, if any.
    pub fn final_answer(&self) -> Option<&str> {
        match self {
            Self::MemoryUpdate { final_answer, .. } => Some(final_answer),
            _ => None,
        }
    }
}

impl From<ConfigError> for OrchestratorError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
