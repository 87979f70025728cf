//! Error types for the agent crate.

use thiserror::Error;

use crate::response::AgentRole;

/// Errors returned by an LLM gateway call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No credential was configured for the selected provider.
    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(String),

    /// The provider rejected the credential.
    #[error("{provider} rejected the configured credential")]
    InvalidCredential {
        /// Provider name.
        provider: String,
    },

    /// The provider returned an error or the request could not be sent.
    #[error("upstream error from {provider}: {message}")]
    Upstream {
        /// Provider name.
        provider: String,
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Sanitized error message.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request to {provider} timed out after {secs}s")]
    Timeout {
        /// Provider name.
        provider: String,
        /// Timeout that elapsed.
        secs: u64,
    },

    /// The response carried no usable text.
    #[error("{provider} returned an empty response")]
    EmptyResponse {
        /// Provider name.
        provider: String,
    },

    /// The per-traversal call budget was used up.
    #[error("gateway call budget of {limit} calls exhausted")]
    BudgetExhausted {
        /// Configured budget.
        limit: usize,
    },
}

/// Errors raised while rendering a prompt template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No template is registered under this name.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// A placeholder had no value supplied.
    #[error("template {template} requires variable {variable:?}")]
    MissingVariable {
        /// Template being rendered.
        template: String,
        /// Placeholder without a value.
        variable: String,
    },

    /// The placeholder pattern failed to compile.
    #[error("invalid placeholder pattern: {0}")]
    Pattern(String),
}

/// Errors raised by a specialist agent operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The gateway call behind an operation failed.
    #[error("{agent} agent failed during {operation}: {source}")]
    Gateway {
        /// Agent whose call failed.
        agent: AgentRole,
        /// Operation that issued the call.
        operation: &'static str,
        /// Underlying gateway error.
        #[source]
        source: GatewayError,
    },

    /// A gateway call of the single-agent baseline failed.
    #[error("unified agent failed during {operation}: {source}")]
    Unified {
        /// Operation that issued the call.
        operation: &'static str,
        /// Underlying gateway error.
        #[source]
        source: GatewayError,
    },

    /// Prompt rendering failed.
    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),
}

impl AgentError {
    /// The gateway error behind this failure, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway { source, .. } | Self::Unified { source, .. } => Some(source),
            Self::Template(_) => None,
        }
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
