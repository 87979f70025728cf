//! The analytical (data science) specialist.
//!
//! Works in two stages: an analysis plan, then a description of the
//! computation that would carry it out. The computation is never run.

use std::sync::Arc;

use pha_core::UserDataBundle;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::gateway::SharedGateway;
use crate::response::{AgentResponse, AgentRole, ExecutionStatus, ResponseDetail};
use crate::specialist::{format_contributions, SpecialistCore};
use crate::template::{PromptVars, TemplateName};

/// Exchanges rendered into the analytical agent's prompts.
pub const ANALYTICAL_WINDOW: usize = 5;

const PLAN_TEMPERATURE: f32 = 0.3;
const COMPUTATION_TEMPERATURE: f32 = 0.2;
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Variables the computation description may refer to.
const DATA_VARIABLES: &str = "\
- heart_rate: hourly samples {timestamp, value} in bpm
- heart_rate_variability: hourly samples {timestamp, value} in ms
- sleep: nightly records {date, total_hours, deep_hours, rem_hours, light_hours, quality_score, times_awakened}
- activity: daily records {date, steps, active_minutes, calories_burned, distance_km, floors_climbed}
- profile: {age, sex, height_cm, weight_kg, activity_level}";

/// Output of both analytical stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub plan: String,
    pub computation: String,
    pub execution: ExecutionStatus,
}

impl AnalysisReport {
    /// The report carried by an analysis response, if it is one.
    pub fn from_response(response: &AgentResponse) -> Option<Self> {
        match &response.detail {
            ResponseDetail::Analysis {
                plan,
                computation,
                execution,
            } => Some(Self {
                plan: plan.clone(),
                computation: computation.clone(),
                execution: *execution,
            }),
            _ => None,
        }
    }

    /// User-facing text when the analysis stands on its own.
    pub fn answer_text(&self) -> String {
        format!("Based on my analysis:\n\n{}", self.plan)
    }

    pub fn into_response(self) -> AgentResponse {
        let content = self.answer_text();
        AgentResponse::new(
            AgentRole::Analytical,
            "analyze",
            content,
            ResponseDetail::Analysis {
                plan: self.plan,
                computation: self.computation,
                execution: self.execution,
            },
        )
    }
}

/// Specialist scoped to the wearable series and the profile.
#[derive(Debug)]
pub struct AnalyticalAgent {
    core: SpecialistCore,
}

impl AnalyticalAgent {
    pub fn new(bundle: Arc<UserDataBundle>, gateway: SharedGateway) -> Result<Self> {
        let vars = PromptVars::new()
            .with("data_overview", bundle.wearable_overview())
            .with("profile", bundle.profile.describe());
        let core = SpecialistCore::new(
            AgentRole::Analytical,
            TemplateName::AnalyticalRole,
            &vars,
            gateway,
            ANALYTICAL_WINDOW,
        )?;
        Ok(Self { core })
    }

    pub fn core(&self) -> &SpecialistCore {
        &self.core
    }

    /// Stage one: discussion and numbered approach.
    pub async fn plan_analysis(&mut self, query: &str) -> Result<String> {
        let task = self.core.render(
            TemplateName::AnalysisPlan,
            &PromptVars::new().with("user_query", query),
        )?;
        self.core
            .invoke("plan_analysis", task, PLAN_TEMPERATURE, query)
            .await
    }

    /// Stage two: describe the computation for `plan`.
    pub async fn describe_computation(&mut self, plan: &str, query: &str) -> Result<String> {
        let task = self.core.render(
            TemplateName::Computation,
            &PromptVars::new()
                .with("user_query", query)
                .with("analysis_plan", plan)
                .with("data_variables", DATA_VARIABLES),
        )?;
        self.core
            .invoke("describe_computation", task, COMPUTATION_TEMPERATURE, query)
            .await
    }

    /// Run both stages.
    pub async fn analyze(&mut self, query: &str) -> Result<AnalysisReport> {
        let plan = self.plan_analysis(query).await?;
        let computation = self.describe_computation(&plan, query).await?;
        info!(
            plan_len = plan.len(),
            computation_len = computation.len(),
            "Analysis complete"
        );
        Ok(AnalysisReport {
            plan,
            computation,
            execution: ExecutionStatus::NotExecuted,
        })
    }

    /// Fold other agents' contributions into the analytical answer.
    pub async fn summarize_findings(
        &mut self,
        query: &str,
        report: &AnalysisReport,
        contributions: &[AgentResponse],
    ) -> Result<AgentResponse> {
        let task = self.core.render(
            TemplateName::AnalyticalSummary,
            &PromptVars::new()
                .with("user_query", query)
                .with("analysis_plan", report.plan.as_str())
                .with("contributions", format_contributions(contributions)),
        )?;
        let content = self
            .core
            .invoke("summarize_findings", task, SUMMARY_TEMPERATURE, query)
            .await?;
        Ok(AgentResponse::synthesis(
            AgentRole::Analytical,
            "summarize_findings",
            content,
            contributions.iter().map(|c| c.agent).collect(),
        ))
    }
}
