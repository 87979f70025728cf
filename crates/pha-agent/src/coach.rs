//! The health coach specialist.

use std::sync::Arc;

use pha_core::UserDataBundle;

use crate::error::Result;
use crate::gateway::SharedGateway;
use crate::response::{AgentResponse, AgentRole, CoachingMode};
use crate::specialist::SpecialistCore;
use crate::template::{PromptVars, TemplateName};

/// Exchanges rendered into the coach's prompts.
pub const COACH_WINDOW: usize = 10;

const GOALS_TEMPERATURE: f32 = 0.7;
const RECOMMEND_TEMPERATURE: f32 = 0.6;
const FEEDBACK_TEMPERATURE: f32 = 0.7;

/// Used when no goal has been recorded yet.
pub const DEFAULT_GOAL: &str = "Improve overall health";

const NOT_AVAILABLE: &str = "Not available";

/// Specialist scoped to the profile only.
#[derive(Debug)]
pub struct CoachAgent {
    core: SpecialistCore,
    user_context: String,
    last_recommendation: Option<String>,
}

impl CoachAgent {
    pub fn new(bundle: Arc<UserDataBundle>, gateway: SharedGateway) -> Result<Self> {
        let user_context = bundle.profile.describe();
        let core = SpecialistCore::new(
            AgentRole::Coach,
            TemplateName::CoachRole,
            &PromptVars::new().with("user_context", user_context.as_str()),
            gateway,
            COACH_WINDOW,
        )?;
        Ok(Self {
            core,
            user_context,
            last_recommendation: None,
        })
    }

    pub fn core(&self) -> &SpecialistCore {
        &self.core
    }

    pub fn last_recommendation(&self) -> Option<&str> {
        self.last_recommendation.as_deref()
    }

    /// Pick the coaching operation for a task description.
    ///
    /// Goal or motivation talk means discovery. Feedback only counts when
    /// there is a previous recommendation to adjust.
    pub fn mode_for(&self, task: &str) -> CoachingMode {
        let task = task.to_lowercase();
        if task.contains("goal") || task.contains("motivation") {
            CoachingMode::GoalDiscovery
        } else if task.contains("feedback") && self.last_recommendation.is_some() {
            CoachingMode::FeedbackAdjustment
        } else {
            CoachingMode::Recommendation
        }
    }

    /// Motivational-interviewing turn to surface goals.
    pub async fn identify_goals(
        &mut self,
        message: &str,
        insights: Option<&str>,
    ) -> Result<AgentResponse> {
        let task = self.core.render(
            TemplateName::CoachGoals,
            &PromptVars::new()
                .with("conversation_history", self.core.log().render())
                .with("user_message", message)
                .with("insights", insights.unwrap_or(NOT_AVAILABLE)),
        )?;
        let content = self
            .core
            .invoke("identify_goals", task, GOALS_TEMPERATURE, message)
            .await?;
        Ok(AgentResponse::coaching(
            "identify_goals",
            content,
            CoachingMode::GoalDiscovery,
        ))
    }

    /// Recommend next steps toward `goals`, or ask for what is still missing.
    ///
    /// `query` is the user's message for this turn and `task` the coaching
    /// task assigned to the coach.
    pub async fn recommend(
        &mut self,
        query: &str,
        task: &str,
        goals: &[String],
        analytical: Option<&str>,
        medical: Option<&str>,
        stage: &str,
    ) -> Result<AgentResponse> {
        let goals = if goals.is_empty() {
            DEFAULT_GOAL.to_string()
        } else {
            goals.join("; ")
        };
        let instruction = self.core.render(
            TemplateName::CoachRecommend,
            &PromptVars::new()
                .with("user_query", query)
                .with("task", task)
                .with("user_goals", goals.as_str())
                .with("user_context", self.user_context.as_str())
                .with("conversation_history", self.core.log().render())
                .with("analytical_insights", analytical.unwrap_or(NOT_AVAILABLE))
                .with("medical_insights", medical.unwrap_or(NOT_AVAILABLE))
                .with("stage", stage),
        )?;
        let content = self
            .core
            .invoke("recommend", instruction, RECOMMEND_TEMPERATURE, query)
            .await?;
        self.last_recommendation = Some(content.clone());
        Ok(AgentResponse::coaching(
            "recommend",
            content,
            CoachingMode::Recommendation,
        ))
    }

    /// Adjust a previous recommendation to the user's feedback.
    pub async fn adapt_recommendation(
        &mut self,
        previous: &str,
        feedback: &str,
    ) -> Result<AgentResponse> {
        let task = self.core.render(
            TemplateName::CoachFeedback,
            &PromptVars::new()
                .with("previous_recommendation", previous)
                .with("user_feedback", feedback)
                .with("conversation_history", self.core.log().render()),
        )?;
        let content = self
            .core
            .invoke("adapt_recommendation", task, FEEDBACK_TEMPERATURE, feedback)
            .await?;
        self.last_recommendation = Some(content.clone());
        Ok(AgentResponse::coaching(
            "adapt_recommendation",
            content,
            CoachingMode::FeedbackAdjustment,
        ))
    }
}
