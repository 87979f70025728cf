//! The knowledge (domain expert) specialist.

use std::sync::Arc;

use pha_core::{to_pretty_json, UserDataBundle};

use crate::error::Result;
use crate::gateway::SharedGateway;
use crate::response::{AgentResponse, AgentRole};
use crate::specialist::{format_contributions, SpecialistCore};
use crate::template::{PromptVars, TemplateName};

/// Exchanges rendered into the knowledge agent's prompts.
pub const KNOWLEDGE_WINDOW: usize = 5;

const ANSWER_TEMPERATURE: f32 = 0.4;
const SYNTHESIS_TEMPERATURE: f32 = 0.5;

/// Specialist scoped to health records, labs, and the metrics summary.
#[derive(Debug)]
pub struct KnowledgeAgent {
    core: SpecialistCore,
    bundle: Arc<UserDataBundle>,
}

impl KnowledgeAgent {
    pub fn new(bundle: Arc<UserDataBundle>, gateway: SharedGateway) -> Result<Self> {
        let context = format!(
            "Profile: {}\n{}\nLabs:\n{}",
            bundle.profile.describe(),
            bundle.health_records_text(),
            bundle.labs_text()
        );
        let core = SpecialistCore::new(
            AgentRole::Knowledge,
            TemplateName::KnowledgeRole,
            &PromptVars::new().with("health_context", context),
            gateway,
            KNOWLEDGE_WINDOW,
        )?;
        Ok(Self { core, bundle })
    }

    pub fn core(&self) -> &SpecialistCore {
        &self.core
    }

    fn metrics_json(&self) -> String {
        to_pretty_json(&self.bundle.metrics_summary())
    }

    /// Answer a health question against the user's records and wearables.
    pub async fn answer_question(&mut self, query: &str) -> Result<AgentResponse> {
        let profile = format!(
            "{}\n{}",
            self.bundle.profile.describe(),
            self.bundle.health_records_text()
        );
        let task = self.core.render(
            TemplateName::KnowledgeAnswer,
            &PromptVars::new()
                .with("user_query", query)
                .with("health_profile", profile)
                .with("wearable_summary", self.metrics_json()),
        )?;
        let content = self
            .core
            .invoke("answer_question", task, ANSWER_TEMPERATURE, query)
            .await?;
        Ok(AgentResponse::answer(
            AgentRole::Knowledge,
            "answer_question",
            content,
        ))
    }

    /// Combine a prior answer or analysis with labs, conditions, and other
    /// agents' contributions.
    pub async fn synthesize_insights(
        &mut self,
        query: &str,
        analysis: Option<&str>,
        contributions: &[AgentResponse],
    ) -> Result<AgentResponse> {
        let task = self.core.render(
            TemplateName::KnowledgeSynthesis,
            &PromptVars::new()
                .with("user_query", query)
                .with("health_records", self.bundle.health_records_text())
                .with("lab_results", self.bundle.labs_text())
                .with("metrics", self.metrics_json())
                .with("analysis", analysis.unwrap_or("Not available"))
                .with("contributions", format_contributions(contributions)),
        )?;
        let content = self
            .core
            .invoke("synthesize_insights", task, SYNTHESIS_TEMPERATURE, query)
            .await?;
        Ok(AgentResponse::synthesis(
            AgentRole::Knowledge,
            "synthesize_insights",
            content,
            contributions.iter().map(|c| c.agent).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseDetail;
    use crate::testing::ScriptedGateway;
    use pha_core::MockDataGenerator;

    fn agent(gateway: Arc<ScriptedGateway>) -> KnowledgeAgent {
        let bundle = Arc::new(MockDataGenerator::new(42).generate());
        KnowledgeAgent::new(bundle, gateway).unwrap()
    }

    #[tokio::test]
    async fn test_answer_question() {
        let gateway = Arc::new(
            ScriptedGateway::new().with_rule("Answer this health question", "LDL is above range."),
        );
        let mut agent = agent(gateway.clone());

        let response = agent.answer_question("Is my LDL ok?").await.unwrap();
        assert_eq!(response.agent, AgentRole::Knowledge);
        assert_eq!(response.content, "LDL is above range.");
        assert_eq!(response.detail, ResponseDetail::Answer);

        let request = &gateway.requests()[0];
        assert_eq!(request.temperature, 0.4);
        assert!(request.task_instruction.contains("avg_resting_heart_rate"));
        assert!(request.role_instruction.contains("ldl_cholesterol"));
        assert!(request.role_instruction.contains("healthcare professional"));
    }

    #[tokio::test]
    async fn test_synthesize_insights_uses_labs_and_analysis() {
        let gateway = Arc::new(
            ScriptedGateway::new().with_rule("Synthesize insights", "Overall summary."),
        );
        let mut agent = agent(gateway.clone());
        let analysis = AgentResponse::answer(AgentRole::Analytical, "analyze", "HR trending down");

        let response = agent
            .synthesize_insights("heart health?", Some("initial answer"), &[analysis])
            .await
            .unwrap();
        assert_eq!(
            response.detail,
            ResponseDetail::Synthesis {
                sources: vec![AgentRole::Analytical]
            }
        );

        let request = &gateway.requests()[0];
        assert_eq!(request.temperature, 0.5);
        assert!(request.task_instruction.contains("Test date: 2024-08-15"));
        assert!(request.task_instruction.contains("Pre-hypertension"));
        assert!(request.task_instruction.contains("initial answer"));
        assert!(request.task_instruction.contains("HR trending down"));
    }
}
