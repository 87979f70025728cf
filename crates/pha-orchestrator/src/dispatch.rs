//! Step 2: the dispatch table over the three specialists.
//!
//! Each role has a contribution operation and a synthesis operation. The
//! main agent's contribution and every supporting contribution run
//! concurrently and see only the query. After the barrier, the main agent's
//! synthesis path receives the successful supporting responses.

use std::sync::Arc;

use futures::future::join_all;
use pha_agent::{
    AgentError, AgentResponse, AgentRole, AnalysisReport, AnalyticalAgent, CoachAgent,
    CoachingMode, KnowledgeAgent, SharedGateway,
};
use pha_core::UserDataBundle;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::plan::OrchestrationPlan;

/// Stage label passed to the coach when it integrates the team's findings.
const COACH_SYNTHESIS_STAGE: &str = "integrating the team's findings into a plan";

/// The three specialists of a session.
#[derive(Debug)]
pub struct SpecialistPool {
    pub analytical: AnalyticalAgent,
    pub knowledge: KnowledgeAgent,
    pub coach: CoachAgent,
}

impl SpecialistPool {
    pub fn new(
        bundle: Arc<UserDataBundle>,
        gateway: SharedGateway,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            analytical: AnalyticalAgent::new(Arc::clone(&bundle), Arc::clone(&gateway))?,
            knowledge: KnowledgeAgent::new(Arc::clone(&bundle), Arc::clone(&gateway))?,
            coach: CoachAgent::new(bundle, gateway)?,
        })
    }

    /// Borrow the main agent and the other two separately.
    pub fn split(&mut self, main: AgentRole) -> (Specialist<'_>, Vec<Specialist<'_>>) {
        let analytical = Specialist::Analytical(&mut self.analytical);
        let knowledge = Specialist::Knowledge(&mut self.knowledge);
        let coach = Specialist::Coach(&mut self.coach);
        match main {
            AgentRole::Analytical => (analytical, vec![knowledge, coach]),
            AgentRole::Knowledge => (knowledge, vec![analytical, coach]),
            AgentRole::Coach => (coach, vec![analytical, knowledge]),
        }
    }
}

/// A mutable handle on one specialist.
pub enum Specialist<'a> {
    Analytical(&'a mut AnalyticalAgent),
    Knowledge(&'a mut KnowledgeAgent),
    Coach(&'a mut CoachAgent),
}

impl Specialist<'_> {
    pub fn role(&self) -> AgentRole {
        match self {
            Self::Analytical(_) => AgentRole::Analytical,
            Self::Knowledge(_) => AgentRole::Knowledge,
            Self::Coach(_) => AgentRole::Coach,
        }
    }

    /// The role's contribution operation.
    pub async fn contribute(
        &mut self,
        query: &str,
        task: &str,
        goals: &[String],
    ) -> Result<AgentResponse, AgentError> {
        match self {
            Self::Analytical(agent) => Ok(agent.analyze(query).await?.into_response()),
            Self::Knowledge(agent) => agent.answer_question(query).await,
            Self::Coach(agent) => match agent.mode_for(task) {
                CoachingMode::GoalDiscovery => agent.identify_goals(query, None).await,
                CoachingMode::FeedbackAdjustment => {
                    let previous = agent.last_recommendation().unwrap_or_default().to_string();
                    agent.adapt_recommendation(&previous, query).await
                }
                CoachingMode::Recommendation => {
                    agent
                        .recommend(query, task, goals, None, None, "initial")
                        .await
                }
            },
        }
    }

    /// The role's synthesis operation over other agents' contributions.
    pub async fn synthesize(
        &mut self,
        query: &str,
        task: &str,
        primary: &AgentResponse,
        contributions: &[AgentResponse],
        goals: &[String],
    ) -> Result<AgentResponse, AgentError> {
        match self {
            Self::Analytical(agent) => {
                let report = AnalysisReport::from_response(primary).unwrap_or(AnalysisReport {
                    plan: primary.content.clone(),
                    computation: String::new(),
                    execution: Default::default(),
                });
                agent.summarize_findings(query, &report, contributions).await
            }
            Self::Knowledge(agent) => {
                agent
                    .synthesize_insights(query, Some(&primary.content), contributions)
                    .await
            }
            Self::Coach(agent) => {
                let analytical = content_of(contributions, AgentRole::Analytical);
                let medical = content_of(contributions, AgentRole::Knowledge);
                agent
                    .recommend(
                        query,
                        task,
                        goals,
                        analytical,
                        medical,
                        COACH_SYNTHESIS_STAGE,
                    )
                    .await
            }
        }
    }
}

fn content_of(responses: &[AgentResponse], role: AgentRole) -> Option<&str> {
    responses
        .iter()
        .find(|r| r.agent == role)
        .map(|r| r.content.as_str())
}

/// A supporting agent whose contribution failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAgent {
    pub agent: AgentRole,
    pub error: String,
}

/// Everything Step 2 produced.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub proposed_answer: String,
    /// Main contribution, successful supporting contributions, then the
    /// synthesis if one ran.
    pub responses: Vec<AgentResponse>,
    pub failed_agents: Vec<FailedAgent>,
}

/// Run Step 2 for `plan`. Only a main agent failure is an error.
pub async fn dispatch(
    pool: &mut SpecialistPool,
    plan: &OrchestrationPlan,
    query: &str,
    goals: &[String],
) -> Result<DispatchOutcome, AgentError> {
    let (mut main, others) = pool.split(plan.main_agent);
    let mut supporting: Vec<Specialist<'_>> = others
        .into_iter()
        .filter(|s| plan.supporting_agents.contains(&s.role()))
        .collect();

    info!(
        main = %plan.main_agent,
        supporting = ?plan.supporting_agents,
        "Dispatching agents"
    );

    let main_task = plan.task_for(plan.main_agent);
    let support_futures = supporting.iter_mut().map(|specialist| {
        let role = specialist.role();
        let task = plan.task_for(role);
        async move { (role, specialist.contribute(query, task, goals).await) }
    });
    let (main_result, support_results) = futures::join!(
        main.contribute(query, main_task, goals),
        join_all(support_futures)
    );

    let primary = main_result?;
    let mut contributions = Vec::new();
    let mut failed_agents = Vec::new();
    for (role, result) in support_results {
        match result {
            Ok(response) => contributions.push(response),
            Err(e) => {
                warn!(agent = %role, "Supporting agent failed: {}", e);
                failed_agents.push(FailedAgent {
                    agent: role,
                    error: e.to_string(),
                });
            }
        }
    }

    let synthesis = if contributions.is_empty() {
        debug!(main = %plan.main_agent, "No supporting contributions, using primary output");
        None
    } else {
        Some(main.synthesize(query, main_task, &primary, &contributions, goals).await?)
    };

    let proposed_answer = synthesis
        .as_ref()
        .map(|s| s.content.clone())
        .unwrap_or_else(|| primary.content.clone());

    let mut responses = Vec::with_capacity(contributions.len() + 2);
    responses.push(primary);
    responses.extend(contributions);
    responses.extend(synthesis);

    Ok(DispatchOutcome {
        proposed_answer,
        responses,
        failed_agents,
    })
}
