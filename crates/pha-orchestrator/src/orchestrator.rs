//! The four-step orchestration state machine.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pha_agent::template::{PromptRegistry, PromptVars, TemplateName};
use pha_agent::{
    AgentResponse, CompletionRequest, Gateway, GatewayError, MeteredGateway, SharedGateway,
};
use pha_core::{to_pretty_json, UserDataBundle};
use pha_memory::{ConversationTurn, Memory, MemoryUpdate, MergeStatus};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::dispatch::{dispatch, FailedAgent, SpecialistPool};
use crate::error::{OrchestratorError, Result};
use crate::plan::{OrchestrationPlan, PlanOrigin};
use crate::reflection::{AnswerSource, ReflectionResult};

const PLAN_TEMPERATURE: f32 = 0.3;
const REFLECTION_TEMPERATURE: f32 = 0.2;
const MEMORY_TEMPERATURE: f32 = 0.3;

/// Turns included in [`ConversationSummary::recent_turns`].
const SUMMARY_TURNS: usize = 3;

/// Where a traversal currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OrchestratorState {
    Idle = 0,
    Understanding = 1,
    Dispatching = 2,
    Reflecting = 3,
    MemoryUpdate = 4,
}

impl OrchestratorState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Understanding,
            2 => Self::Dispatching,
            3 => Self::Reflecting,
            4 => Self::MemoryUpdate,
            _ => Self::Idle,
        }
    }

    /// Step number, `None` when idle.
    pub fn step(self) -> Option<u8> {
        match self {
            Self::Idle => None,
            other => Some(other as u8),
        }
    }
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Understanding => write!(f, "understanding"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Reflecting => write!(f, "reflecting"),
            Self::MemoryUpdate => write!(f, "memory update"),
        }
    }
}

/// Returns the state to `Idle` however the traversal ends.
struct StateGuard<'a> {
    state: &'a AtomicU8,
}

impl<'a> StateGuard<'a> {
    fn new(state: &'a AtomicU8) -> Self {
        Self { state }
    }

    fn enter(&self, next: OrchestratorState) {
        self.state.store(next as u8, Ordering::SeqCst);
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.state
            .store(OrchestratorState::Idle as u8, Ordering::SeqCst);
    }
}

/// One completed step of a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub state: OrchestratorState,
    pub elapsed: Duration,
    /// Gateway calls made by this step.
    pub gateway_calls: usize,
    pub summary: String,
}

/// Everything a traversal produced.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// Identifier shared by every log line of this traversal.
    pub traversal_id: Uuid,
    /// The user's query as received.
    pub query: String,
    /// Routing after any budget trimming.
    pub plan: OrchestrationPlan,
    /// Main contribution, supporting contributions, then any synthesis.
    pub agent_responses: Vec<AgentResponse>,
    /// Supporting agents whose contribution failed.
    pub failed_agents: Vec<FailedAgent>,
    /// Absorbed problems worth showing the user.
    pub notices: Vec<String>,
    /// The Step 3 review of the proposed answer.
    pub reflection: ReflectionResult,
    /// Text shown to the user and recorded in memory.
    pub final_answer: String,
    /// Which text became `final_answer`.
    pub answer_source: AnswerSource,
    /// How the extracted entities were merged.
    pub memory_update: MergeStatus,
    /// Memory snapshot after this turn was recorded.
    pub memory: Memory,
    /// Gateway calls across all steps.
    pub gateway_calls: usize,
    /// Wall-clock time of the whole traversal.
    pub elapsed: Duration,
    /// One record per completed step, in order.
    pub trace: Vec<StepRecord>,
}

/// Condensed view of the session so far.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub total_turns: u64,
    pub goals: usize,
    pub action_items: usize,
    pub recent_turns: Vec<ConversationTurn>,
}

struct Session {
    memory: Memory,
    specialists: SpecialistPool,
}

/// Coordinates the specialists for one user session.
///
/// One traversal runs at a time; concurrent callers queue on the session
/// lock.
pub struct Orchestrator {
    config: OrchestratorConfig,
    gateway: Arc<MeteredGateway>,
    role_instruction: String,
    session: Mutex<Session>,
    state: AtomicU8,
}

impl Orchestrator {
    /// Create an orchestrator with empty memory.
    pub fn new(
        bundle: Arc<UserDataBundle>,
        gateway: SharedGateway,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let gateway = Arc::new(MeteredGateway::with_budget(
            gateway,
            Some(config.max_gateway_calls_per_turn),
        ));
        let shared: SharedGateway = gateway.clone();
        let specialists = SpecialistPool::new(bundle, shared)
            .map_err(|e| OrchestratorError::Configuration(e.to_string()))?;
        let role_instruction =
            PromptRegistry::global().render(TemplateName::OrchestratorRole, &PromptVars::new())?;

        info!(
            model = %gateway.model_id(),
            budget = config.max_gateway_calls_per_turn,
            "Orchestrator ready"
        );

        Ok(Self {
            config,
            gateway,
            role_instruction,
            session: Mutex::new(Session {
                memory: Memory::new(config.memory_limits()),
                specialists,
            }),
            state: AtomicU8::new(OrchestratorState::Idle as u8),
        })
    }

    /// Replace the initial memory, e.g. with one seeded from the bundle.
    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.session.get_mut().memory = memory;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn state(&self) -> OrchestratorState {
        OrchestratorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn model_id(&self) -> &str {
        self.gateway.model_id()
    }

    /// Gateway calls made by the current or most recent traversal.
    pub fn gateway_calls(&self) -> usize {
        self.gateway.calls()
    }

    /// Snapshot of the session memory. Waits for a running traversal.
    pub async fn memory(&self) -> Memory {
        self.session.lock().await.memory.clone()
    }

    pub async fn conversation_summary(&self) -> ConversationSummary {
        let session = self.session.lock().await;
        let memory = &session.memory;
        ConversationSummary {
            total_turns: memory.total_turns(),
            goals: memory.goals().len(),
            action_items: memory.action_items().len(),
            recent_turns: memory
                .recent_turns(SUMMARY_TURNS)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    async fn complete(&self, task: String, temperature: f32) -> std::result::Result<String, GatewayError> {
        let request = CompletionRequest::new(self.role_instruction.clone(), task)
            .with_temperature(temperature);
        self.gateway.complete(&request).await
    }

    /// Run one query through all four steps.
    pub async fn process_query(&self, query: &str) -> Result<QueryOutcome> {
        let mut session = self.session.lock().await;
        let Session {
            memory,
            specialists,
        } = &mut *session;

        let guard = StateGuard::new(&self.state);
        let traversal_id = Uuid::new_v4();
        let budget = self.config.max_gateway_calls_per_turn;
        let started = Instant::now();
        let mut trace = Vec::with_capacity(4);
        let mut notices = Vec::new();
        self.gateway.reset();

        info!(%traversal_id, query_len = query.len(), "Traversal started");

        // Step 1: understand the need.
        guard.enter(OrchestratorState::Understanding);
        let step = Instant::now();
        let task = PromptRegistry::global().render(
            TemplateName::TaskAssignment,
            &PromptVars::new()
                .with("user_query", query)
                .with(
                    "conversation_history",
                    memory.format_history(self.config.prompt_history_turns),
                )
                .with("memory", memory.entities_json()),
        )?;
        let raw_plan = self
            .complete(task, PLAN_TEMPERATURE)
            .await
            .map_err(OrchestratorError::Understanding)?;
        let mut plan = OrchestrationPlan::from_model_output(query, &raw_plan);
        if let PlanOrigin::Fallback { reason } = &plan.origin {
            warn!(%traversal_id, "Plan unusable, falling back to analytical: {}", reason);
            notices.push(format!("Routing fell back to the analytical agent: {reason}"));
        }
        for role in plan.trim_to_budget(budget) {
            warn!(%traversal_id, agent = %role, budget, "Trimmed supporting agent");
            notices.push(format!(
                "Skipped the {role} agent to stay within {budget} gateway calls"
            ));
        }
        let mut calls_so_far = self.gateway.calls();
        trace.push(StepRecord {
            state: OrchestratorState::Understanding,
            elapsed: step.elapsed(),
            gateway_calls: calls_so_far,
            summary: format!(
                "main={}, supporting={:?}, projected_calls={}{}",
                plan.main_agent,
                plan.supporting_agents.iter().map(|r| r.code()).collect::<Vec<_>>(),
                plan.projected_calls(),
                if plan.is_fallback() { ", fallback" } else { "" }
            ),
        });

        // Step 2: dispatch.
        guard.enter(OrchestratorState::Dispatching);
        let step = Instant::now();
        let goals = memory.goals().to_vec();
        let dispatched = dispatch(specialists, &plan, query, &goals)
            .await
            .map_err(OrchestratorError::MainAgent)?;
        for failed in &dispatched.failed_agents {
            notices.push(format!("The {} agent failed: {}", failed.agent, failed.error));
        }
        trace.push(StepRecord {
            state: OrchestratorState::Dispatching,
            elapsed: step.elapsed(),
            gateway_calls: self.gateway.calls() - calls_so_far,
            summary: format!(
                "{} responses, {} failed",
                dispatched.responses.len(),
                dispatched.failed_agents.len()
            ),
        });
        calls_so_far = self.gateway.calls();

        // Step 3: reflect.
        guard.enter(OrchestratorState::Reflecting);
        let step = Instant::now();
        let task = PromptRegistry::global().render(
            TemplateName::Reflection,
            &PromptVars::new()
                .with("user_query", query)
                .with("orchestration_plan", to_pretty_json(&plan))
                .with("agent_responses", to_pretty_json(&dispatched.responses))
                .with("proposed_response", dispatched.proposed_answer.as_str()),
        )?;
        let reflection = match self.complete(task, REFLECTION_TEMPERATURE).await {
            Ok(text) => ReflectionResult::from_model_output(&text),
            Err(e) => {
                warn!(%traversal_id, "Reflection call failed: {}", e);
                ReflectionResult::unavailable(e.to_string())
            }
        };
        let (final_answer, answer_source) = reflection.resolve(&dispatched.proposed_answer);
        if answer_source == AnswerSource::Unrevised {
            if !reflection.issues.is_empty() {
                notices.push(format!("Review flagged: {}", reflection.issues.join("; ")));
            }
            if let Some(suggestions) = &reflection.suggestions {
                notices.push(format!("Review suggested: {suggestions}"));
            }
        }
        trace.push(StepRecord {
            state: OrchestratorState::Reflecting,
            elapsed: step.elapsed(),
            gateway_calls: self.gateway.calls() - calls_so_far,
            summary: format!(
                "approved={}, issues={}, answer={:?}",
                reflection.approved,
                reflection.issues.len(),
                answer_source
            ),
        });
        calls_so_far = self.gateway.calls();

        // Step 4: update memory.
        guard.enter(OrchestratorState::MemoryUpdate);
        let step = Instant::now();
        let task = PromptRegistry::global().render(
            TemplateName::MemoryUpdate,
            &PromptVars::new()
                .with("user_query", query)
                .with("final_response", final_answer.as_str())
                .with("current_memory", memory.entities_json()),
        )?;
        let extraction = match self.complete(task, MEMORY_TEMPERATURE).await {
            Ok(text) => text,
            Err(source) => {
                warn!(%traversal_id, "Memory update call failed: {}", source);
                return Err(OrchestratorError::MemoryUpdate {
                    final_answer,
                    source,
                });
            }
        };

        let memory_update = match MemoryUpdate::parse(&extraction) {
            Ok(update) => MergeStatus::Merged {
                changed: memory.apply(&update),
            },
            Err(e) => {
                warn!(%traversal_id, "Memory extraction unparseable: {}", e);
                MergeStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        };
        let turn = memory.record_turn(query, final_answer.as_str());
        trace.push(StepRecord {
            state: OrchestratorState::MemoryUpdate,
            elapsed: step.elapsed(),
            gateway_calls: self.gateway.calls() - calls_so_far,
            summary: format!("{memory_update}, turn {turn}"),
        });

        let gateway_calls = self.gateway.calls();
        debug!(%traversal_id, ?answer_source, "Final answer chosen");
        info!(
            %traversal_id,
            gateway_calls,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Traversal complete"
        );

        Ok(QueryOutcome {
            traversal_id,
            query: query.to_string(),
            plan,
            agent_responses: dispatched.responses,
            failed_agents: dispatched.failed_agents,
            notices,
            reflection,
            final_answer,
            answer_source,
            memory_update,
            memory: memory.clone(),
            gateway_calls,
            elapsed: started.elapsed(),
            trace,
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            OrchestratorState::Idle,
            OrchestratorState::Understanding,
            OrchestratorState::Dispatching,
            OrchestratorState::Reflecting,
            OrchestratorState::MemoryUpdate,
        ] {
            assert_eq!(OrchestratorState::from_u8(state as u8), state);
        }
        assert_eq!(OrchestratorState::Idle.step(), None);
        assert_eq!(OrchestratorState::MemoryUpdate.step(), Some(4));
    }

    #[test]
    fn test_guard_resets_state() {
        let state = AtomicU8::new(0);
        {
            let guard = StateGuard::new(&state);
            guard.enter(OrchestratorState::Reflecting);
            assert_eq!(state.load(Ordering::SeqCst), 3);
        }
        assert_eq!(state.load(Ordering::SeqCst), 0);
    }
}
