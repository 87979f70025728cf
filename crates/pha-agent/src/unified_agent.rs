//! Single-agent baseline.
//!
//! Folds the three specialties into one role instruction and answers each
//! query in at most two gateway calls: one for the answer, one for memory
//! extraction. Used to compare against the orchestrated pipeline.

use std::sync::Arc;

use pha_core::UserDataBundle;
use pha_memory::{Memory, MemoryLimits, MemoryUpdate, MergeStatus, NO_HISTORY};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::gateway::{CompletionRequest, Gateway, MeteredGateway, SharedGateway};
use crate::template::{PromptRegistry, PromptVars, TemplateName};

/// Gateway calls allowed per query.
pub const UNIFIED_CALL_BUDGET: usize = 2;

const ANSWER_TEMPERATURE: f32 = 0.6;
const MEMORY_TEMPERATURE: f32 = 0.3;

/// History turns included in the answer prompt.
const PROMPT_HISTORY_TURNS: usize = 5;

const EXTRACTION_ROLE: &str =
    "You are a helpful assistant that extracts structured information from conversations.";

/// Result of one unified query.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedOutcome {
    pub answer: String,
    pub memory_update: MergeStatus,
    pub memory: Memory,
    pub gateway_calls: usize,
}

/// The single-agent baseline with its own memory.
pub struct UnifiedAgent {
    bundle: Arc<UserDataBundle>,
    gateway: MeteredGateway,
    memory: Memory,
    max_output_tokens: u32,
}

impl UnifiedAgent {
    /// Create an agent whose memory is seeded from the bundle's conditions
    /// and medications.
    pub fn new(bundle: Arc<UserDataBundle>, gateway: SharedGateway, limits: MemoryLimits) -> Self {
        let memory = Memory::seeded(limits, bundle.condition_names(), bundle.medication_names());
        Self {
            bundle,
            gateway: MeteredGateway::with_budget(gateway, Some(UNIFIED_CALL_BUDGET)),
            memory,
            max_output_tokens: crate::config::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens.max(1);
        self
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn model_id(&self) -> &str {
        self.gateway.model_id()
    }

    /// Gateway calls made by the current or most recent query.
    pub fn gateway_calls(&self) -> usize {
        self.gateway.calls()
    }

    fn role_instruction(&self) -> Result<String> {
        let list = |items: &[String]| {
            if items.is_empty() {
                "None".to_string()
            } else {
                items.join(", ")
            }
        };
        let vars = PromptVars::new()
            .with("user_data", self.bundle.summary_text())
            .with("goals", list(self.memory.goals()))
            .with("conditions", list(self.memory.conditions()))
            .with("medications", list(self.memory.medications()))
            .with("action_items", list(&self.memory.action_items()))
            .with("key_metrics", list(&self.memory.key_metrics()));
        Ok(PromptRegistry::global().render(TemplateName::UnifiedRole, &vars)?)
    }

    fn task_instruction(&self, query: &str) -> String {
        let history = self.memory.format_history(PROMPT_HISTORY_TURNS);
        if history == NO_HISTORY {
            format!(
                "User Query: {query}\n\nRespond by drawing on your data analysis, medical expertise, and coaching skills as appropriate."
            )
        } else {
            format!(
                "Conversation History:\n{history}\n\nCurrent User Query: {query}\n\nRespond by drawing on your data analysis, medical expertise, and coaching skills as appropriate. Keep the context of the history above."
            )
        }
    }

    async fn call(
        &self,
        operation: &'static str,
        request: CompletionRequest,
    ) -> std::result::Result<String, AgentError> {
        debug!(operation, temperature = request.temperature, "Unified gateway call");
        self.gateway
            .complete(&request)
            .await
            .map_err(|source| AgentError::Unified { operation, source })
    }

    /// Answer a query and update memory.
    ///
    /// A failed answer call is an error. A failed or unparseable extraction
    /// skips the merge; the turn is still recorded.
    pub async fn process_query(&mut self, query: &str) -> Result<UnifiedOutcome> {
        self.gateway.reset();

        let request = CompletionRequest::new(self.role_instruction()?, self.task_instruction(query))
            .with_temperature(ANSWER_TEMPERATURE)
            .with_max_output_tokens(self.max_output_tokens);
        let answer = self.call("answer", request).await?;

        let extraction = PromptRegistry::global().render(
            TemplateName::UnifiedMemoryUpdate,
            &PromptVars::new()
                .with("user_query", query)
                .with("agent_response", answer.as_str())
                .with("current_memory", self.memory.entities_json()),
        )?;
        let request = CompletionRequest::new(EXTRACTION_ROLE, extraction)
            .with_temperature(MEMORY_TEMPERATURE)
            .with_max_output_tokens(self.max_output_tokens);

        let memory_update = match self.call("update_memory", request).await {
            Ok(text) => match MemoryUpdate::parse(&text) {
                Ok(update) => MergeStatus::Merged {
                    changed: self.memory.apply(&update),
                },
                Err(e) => {
                    warn!("Unified memory extraction unparseable: {}", e);
                    MergeStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!("Unified memory extraction failed: {}", e);
                MergeStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        };
        self.memory.record_turn(query, answer.as_str());

        let gateway_calls = self.gateway.calls();
        info!(gateway_calls, %memory_update, "Unified query complete");
        Ok(UnifiedOutcome {
            answer,
            memory_update,
            memory: self.memory.clone(),
            gateway_calls,
        })
    }
}

impl std::fmt::Debug for UnifiedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiedAgent")
            .field("model", &self.gateway.model_id())
            .field("turns", &self.memory.total_turns())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::testing::ScriptedGateway;
    use pha_core::MockDataGenerator;

    const MEMORY_MARKER: &str = "Extract and log key entities";

    fn agent(gateway: Arc<ScriptedGateway>) -> UnifiedAgent {
        let bundle = Arc::new(MockDataGenerator::new(42).generate());
        UnifiedAgent::new(bundle, gateway, MemoryLimits::default())
    }

    #[tokio::test]
    async fn test_two_calls_and_merge() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_rule(MEMORY_MARKER, r#"{"goals": ["Sleep 8 hours"], "lifestyle": {"sleep": "late nights"}}"#)
                .with_default("Aim for a consistent bedtime."),
        );
        let mut agent = agent(gateway.clone());
        assert_eq!(agent.memory().conditions(), &["Pre-hypertension"]);

        let outcome = agent.process_query("How can I sleep better?").await.unwrap();
        assert_eq!(outcome.answer, "Aim for a consistent bedtime.");
        assert_eq!(outcome.gateway_calls, 2);
        assert_eq!(outcome.memory_update, MergeStatus::Merged { changed: 2 });
        assert_eq!(outcome.memory.goals(), &["Sleep 8 hours"]);
        assert_eq!(outcome.memory.total_turns(), 1);

        let requests = gateway.requests();
        assert_eq!(requests[0].temperature, 0.6);
        assert_eq!(requests[1].temperature, 0.3);
        assert!(requests[0].role_instruction.contains("35 y/o male"));
        assert!(requests[0].task_instruction.starts_with("User Query: How can I sleep better?"));
    }

    #[tokio::test]
    async fn test_second_query_sees_history_and_goals() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_rule(MEMORY_MARKER, r#"{"goals": ["Sleep 8 hours"]}"#)
                .with_default("answer"),
        );
        let mut agent = agent(gateway.clone());
        agent.process_query("first").await.unwrap();
        let outcome = agent.process_query("second").await.unwrap();
        assert_eq!(outcome.gateway_calls, 2);

        let third = &gateway.requests()[2];
        assert!(third.task_instruction.contains("User: first\n\nAssistant: answer"));
        assert!(third.role_instruction.contains("Goals: Sleep 8 hours"));
    }

    #[tokio::test]
    async fn test_unparseable_extraction_still_records_turn() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_rule(MEMORY_MARKER, "nothing to extract")
                .with_default("answer"),
        );
        let mut agent = agent(gateway);
        let outcome = agent.process_query("hi").await.unwrap();

        assert!(!outcome.memory_update.is_merged());
        assert!(outcome.memory.goals().is_empty());
        assert_eq!(outcome.memory.total_turns(), 1);
    }

    #[tokio::test]
    async fn test_answer_failure_is_error() {
        let gateway = Arc::new(ScriptedGateway::new().with_failure(
            "User Query",
            GatewayError::Timeout {
                provider: "scripted".into(),
                secs: 60,
            },
        ));
        let mut agent = agent(gateway);
        let err = agent.process_query("hi").await.unwrap_err();

        assert!(matches!(err, AgentError::Unified { operation: "answer", .. }));
        assert_eq!(agent.memory().total_turns(), 0);
    }
}
