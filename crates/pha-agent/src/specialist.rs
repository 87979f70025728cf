//! State and call path shared by every specialist agent.

use tracing::{debug, trace, warn};

use crate::config::DEFAULT_MAX_TOKENS;
use crate::context::{ConversationLog, Exchange};
use crate::error::{AgentError, Result};
use crate::gateway::{CompletionRequest, SharedGateway};
use crate::response::AgentRole;
use crate::template::{PromptRegistry, PromptVars, TemplateName};

/// Role, role instruction, gateway, and private log of one specialist.
pub struct SpecialistCore {
    role: AgentRole,
    role_instruction: String,
    gateway: SharedGateway,
    max_output_tokens: u32,
    log: ConversationLog,
}

impl SpecialistCore {
    /// Build a core whose role instruction is rendered once from
    /// `role_template`.
    pub fn new(
        role: AgentRole,
        role_template: TemplateName,
        vars: &PromptVars,
        gateway: SharedGateway,
        window: usize,
    ) -> Result<Self> {
        let role_instruction = PromptRegistry::global().render(role_template, vars)?;
        Ok(Self {
            role,
            role_instruction,
            gateway,
            max_output_tokens: DEFAULT_MAX_TOKENS,
            log: ConversationLog::new(window, role.label()),
        })
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens.max(1);
        self
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn role_instruction(&self) -> &str {
        &self.role_instruction
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Render a task template with the shared registry.
    pub fn render(&self, template: TemplateName, vars: &PromptVars) -> Result<String> {
        Ok(PromptRegistry::global().render(template, vars)?)
    }

    /// Run one gateway call and record it in the log.
    ///
    /// `log_input` is the text stored as the user side of the exchange.
    pub async fn invoke(
        &mut self,
        operation: &'static str,
        task: String,
        temperature: f32,
        log_input: &str,
    ) -> Result<String> {
        let request = CompletionRequest::new(self.role_instruction.clone(), task)
            .with_temperature(temperature)
            .with_max_output_tokens(self.max_output_tokens);

        trace!(
            agent = %self.role,
            operation,
            prompt_len = request.prompt_len(),
            "Rendered prompt"
        );
        debug!(agent = %self.role, operation, temperature, "Calling gateway");

        let output = match self.gateway.complete(&request).await {
            Ok(output) => output,
            Err(source) => {
                warn!(agent = %self.role, operation, "Gateway call failed: {}", source);
                return Err(AgentError::Gateway {
                    agent: self.role,
                    operation,
                    source,
                });
            }
        };

        self.log.push(Exchange::new(operation, log_input, output.clone()));
        Ok(output)
    }
}

impl std::fmt::Debug for SpecialistCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistCore")
            .field("role", &self.role)
            .field("model", &self.gateway.model_id())
            .field("exchanges", &self.log.len())
            .finish()
    }
}

/// Render other agents' responses as a labelled block for a synthesis prompt.
pub fn format_contributions(contributions: &[crate::response::AgentResponse]) -> String {
    if contributions.is_empty() {
        return "None".to_string();
    }
    contributions
        .iter()
        .map(|c| format!("[{}]\n{}", c.agent.label(), c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
