//! End-to-end traversals against a scripted gateway.

use std::sync::Arc;
use std::time::Duration;

use pha_agent::testing::ScriptedGateway;
use pha_agent::{AgentRole, CoachingMode, ResponseDetail};
use pha_core::{MockDataGenerator, UserDataBundle};
use pha_memory::{Memory, MergeStatus};
use pha_orchestrator::{
    AnswerSource, Orchestrator, OrchestratorConfig, OrchestratorError, OrchestratorState,
};

const PLAN: &str = "Identify the main agent and any supporting agents";
const REFLECTION: &str = "Review the proposed response";
const MEMORY: &str = "Extract and log key entities";
const ANALYSIS_PLAN: &str = "create a detailed analysis plan";
const COMPUTATION: &str = "Describe the computation";
const ANALYTICAL_SUMMARY: &str = "Summarize the findings";
const KNOWLEDGE_ANSWER: &str = "Answer this health question";
const KNOWLEDGE_SYNTHESIS: &str = "Synthesize insights";
const COACH_RECOMMEND: &str = "determine if it's time to make a recommendation";

const APPROVED: &str = r#"{"approved": true, "issues": [], "revised_content": null}"#;
const EMPTY_MEMORY: &str = r#"{"goals": []}"#;

fn bundle() -> Arc<UserDataBundle> {
    Arc::new(MockDataGenerator::new(42).generate())
}

fn orchestrator(gateway: Arc<ScriptedGateway>) -> Orchestrator {
    orchestrator_with(gateway, OrchestratorConfig::default())
}

fn orchestrator_with(gateway: Arc<ScriptedGateway>, config: OrchestratorConfig) -> Orchestrator {
    Orchestrator::new(bundle(), gateway, config).unwrap()
}

fn plan_json(main: &str, supporting: &[&str]) -> String {
    let supporting = supporting
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{"user_intent": "Understand recent sleep", "main_agent": "{main}", "supporting_agents": [{supporting}], "rationale": "personal data", "tasks": {{"DS": "Average sleep duration", "DE": "Interpret sleep duration", "HC": "Suggest a bedtime routine"}}}}"#
    )
}

/// Analytical main agent with scripted analysis stages.
fn analytical_gateway() -> ScriptedGateway {
    ScriptedGateway::new()
        .with_rule(ANALYSIS_PLAN, "Average sleep hours over 30 nights.")
        .with_rule(COMPUTATION, "mean(sleep_hours)")
        .with_rule(ANALYTICAL_SUMMARY, "You slept 7.1 hours on average.")
}

#[tokio::test]
async fn test_malformed_plan_falls_back_to_analytical() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, "I would send this to the data person.")
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway.clone());

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert!(outcome.plan.is_fallback());
    assert_eq!(outcome.plan.main_agent, AgentRole::Analytical);
    assert!(outcome.plan.supporting_agents.is_empty());
    assert!(outcome.final_answer.contains("Average sleep hours over 30 nights."));
    assert!(outcome.notices.iter().any(|n| n.contains("fell back")));
    assert_eq!(outcome.gateway_calls, 5);
    assert_eq!(gateway.calls(), 5);
    assert_eq!(gateway.calls_matching(ANALYTICAL_SUMMARY), 0);
}

#[tokio::test]
async fn test_sleep_query_extracts_goal() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &["DE"]))
            .with_rule(KNOWLEDGE_ANSWER, "Adults need 7 to 9 hours.")
            .with_rule(REFLECTION, APPROVED)
            .with_rule(
                MEMORY,
                r#"{"goals": ["Sleep 8 hours per night"], "lifestyle": {"sleep": "late bedtime"}}"#,
            ),
    );
    let orchestrator = orchestrator(gateway.clone());

    let outcome = orchestrator
        .process_query("How has my sleep been this month and is it enough?")
        .await
        .unwrap();

    assert_eq!(outcome.plan.main_agent, AgentRole::Analytical);
    assert_eq!(outcome.final_answer, "You slept 7.1 hours on average.");
    assert_eq!(outcome.answer_source, AnswerSource::Approved);
    assert_eq!(outcome.memory.goals(), &["Sleep 8 hours per night"]);
    assert!(outcome.memory_update.is_merged());
    assert_eq!(outcome.memory.total_turns(), 1);
    // plan + 2 analytical + knowledge + synthesis + reflection + memory
    assert_eq!(outcome.gateway_calls, 7);
    assert_eq!(outcome.trace.len(), 4);
    assert_eq!(orchestrator.state(), OrchestratorState::Idle);

    let summary = orchestrator.conversation_summary().await;
    assert_eq!(summary.total_turns, 1);
    assert_eq!(summary.goals, 1);
}

#[tokio::test]
async fn test_monthly_sleep_question_records_sleep_goal() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, r#"{"goals": ["Improve sleep quality"]}"#),
    );
    let orchestrator = orchestrator(gateway.clone());

    let outcome = orchestrator
        .process_query("How has my sleep been this month?")
        .await
        .unwrap();

    assert_eq!(outcome.plan.main_agent, AgentRole::Analytical);
    assert!(!outcome.final_answer.trim().is_empty());
    assert!(outcome
        .memory
        .goals()
        .iter()
        .any(|g| g.to_lowercase().contains("sleep")));
    assert_eq!(outcome.gateway_calls, 5);
    assert_eq!(gateway.calls(), 5);
}

#[tokio::test]
async fn test_knowledge_main_synthesizes_analysis() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DE", &["DS"]))
            .with_rule(KNOWLEDGE_ANSWER, "Adults need 7 to 9 hours.")
            .with_rule(
                KNOWLEDGE_SYNTHESIS,
                "At 7.1 hours you are inside the healthy range.",
            )
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway.clone());
    let query = "Is my sleep duration healthy for my age?";

    let outcome = orchestrator.process_query(query).await.unwrap();

    assert_eq!(outcome.plan.main_agent, AgentRole::Knowledge);
    assert_eq!(
        outcome.final_answer,
        "At 7.1 hours you are inside the healthy range."
    );
    let synthesis = outcome.agent_responses.last().unwrap();
    assert_eq!(synthesis.agent, AgentRole::Knowledge);
    assert_eq!(synthesis.operation, "synthesize_insights");
    assert_eq!(
        synthesis.detail,
        ResponseDetail::Synthesis {
            sources: vec![AgentRole::Analytical]
        }
    );
    // plan + knowledge answer + 2 analytical + synthesis + reflection + memory
    assert_eq!(outcome.gateway_calls, 7);

    let knowledge_requests: Vec<_> = gateway
        .requests()
        .into_iter()
        .filter(|r| {
            r.task_instruction.contains(KNOWLEDGE_ANSWER)
                || r.task_instruction.contains(KNOWLEDGE_SYNTHESIS)
        })
        .collect();
    assert_eq!(knowledge_requests.len(), 2);
    assert!(knowledge_requests
        .iter()
        .all(|r| r.task_instruction.contains(query)));
}

#[tokio::test]
async fn test_coach_main_sees_query_and_task() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .with_rule(PLAN, plan_json("HC", &["DE"]))
            .with_rule(KNOWLEDGE_ANSWER, "Consistent bedtimes help sleep quality.")
            .with_rule(COACH_RECOMMEND, "Wind down at 22:00 with the lights low.")
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway.clone());
    let query = "I sleep badly when I am under stress at work. What should I change?";

    let outcome = orchestrator.process_query(query).await.unwrap();

    assert_eq!(outcome.plan.main_agent, AgentRole::Coach);
    assert_eq!(outcome.final_answer, "Wind down at 22:00 with the lights low.");
    assert_eq!(
        outcome.agent_responses.last().unwrap().detail,
        ResponseDetail::Coaching {
            mode: CoachingMode::Recommendation
        }
    );
    // plan + coach + knowledge + coach synthesis + reflection + memory
    assert_eq!(outcome.gateway_calls, 6);

    let coach_requests: Vec<_> = gateway
        .requests()
        .into_iter()
        .filter(|r| r.task_instruction.contains(COACH_RECOMMEND))
        .collect();
    assert_eq!(coach_requests.len(), 2);
    for request in &coach_requests {
        assert!(request.task_instruction.contains("under stress at work"));
        assert!(request.task_instruction.contains("Suggest a bedtime routine"));
    }
    assert!(coach_requests[1]
        .task_instruction
        .contains("Consistent bedtimes help sleep quality."));
}

#[tokio::test]
async fn test_supporting_failure_is_absorbed() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &["DE", "HC"]))
            .failing_on(KNOWLEDGE_ANSWER)
            .with_rule(COACH_RECOMMEND, "Try a fixed bedtime this week.")
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway.clone());

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert!(!outcome.final_answer.is_empty());
    assert_eq!(outcome.failed_agents.len(), 1);
    assert_eq!(outcome.failed_agents[0].agent, AgentRole::Knowledge);
    assert!(outcome.notices.iter().any(|n| n.contains("knowledge agent failed")));

    let synthesis = outcome.agent_responses.last().unwrap();
    assert_eq!(
        synthesis.detail,
        ResponseDetail::Synthesis {
            sources: vec![AgentRole::Coach]
        }
    );
    assert!(!outcome
        .agent_responses
        .iter()
        .any(|r| r.agent == AgentRole::Knowledge));
}

#[tokio::test]
async fn test_main_agent_failure_ends_traversal() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .with_rule(PLAN, plan_json("DS", &[]))
            .failing_on(ANALYSIS_PLAN),
    );
    let orchestrator = orchestrator(gateway.clone());

    let err = orchestrator.process_query("How did I sleep?").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::MainAgent(_)));
    assert!(err.final_answer().is_none());
    assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    assert_eq!(orchestrator.memory().await.total_turns(), 0);
    assert_eq!(gateway.calls_matching(REFLECTION), 0);
}

#[tokio::test]
async fn test_reflection_revision_replaces_answer() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(
                REFLECTION,
                r#"{"approved": false, "issues": ["no safety note"], "revised_content": "Revised: see a doctor if you snore."}"#,
            )
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway);

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert_eq!(outcome.answer_source, AnswerSource::Revised);
    assert_eq!(outcome.final_answer, "Revised: see a doctor if you snore.");
    let turns = outcome.memory.recent_turns(1);
    assert_eq!(turns[0].assistant_text, "Revised: see a doctor if you snore.");
}

#[tokio::test]
async fn test_unrevised_review_surfaces_issues_and_suggestions() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(
                REFLECTION,
                r#"{"approved": false, "issues": ["too vague"], "revised_content": null, "suggestions": "Mention the weekend dip."}"#,
            )
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway);

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert_eq!(outcome.answer_source, AnswerSource::Unrevised);
    assert!(outcome.final_answer.contains("Average sleep hours over 30 nights."));
    assert!(outcome
        .notices
        .contains(&"Review flagged: too vague".to_string()));
    assert!(outcome
        .notices
        .contains(&"Review suggested: Mention the weekend dip.".to_string()));
}

#[tokio::test]
async fn test_unparseable_reflection_keeps_proposed_answer() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(REFLECTION, "Looks good to me.")
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let orchestrator = orchestrator(gateway);

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert_eq!(outcome.answer_source, AnswerSource::Unreviewed);
    assert!(!outcome.reflection.approved);
    assert!(outcome.final_answer.contains("Average sleep hours over 30 nights."));
}

#[tokio::test]
async fn test_unparseable_extraction_still_records_turn() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, "No new entities."),
    );
    let orchestrator = orchestrator(gateway);

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert!(matches!(outcome.memory_update, MergeStatus::Skipped { .. }));
    assert_eq!(outcome.memory.total_turns(), 1);
    assert!(outcome.memory.goals().is_empty());
}

#[tokio::test]
async fn test_memory_update_failure_carries_answer() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(REFLECTION, APPROVED)
            .failing_on(MEMORY),
    );
    let orchestrator = orchestrator(gateway);

    let err = orchestrator.process_query("How did I sleep?").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::MemoryUpdate { .. }));
    assert!(err
        .final_answer()
        .unwrap()
        .contains("Average sleep hours over 30 nights."));
    assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    assert_eq!(orchestrator.memory().await.total_turns(), 0);
}

#[tokio::test]
async fn test_budget_trims_lowest_priority_supporting_agent() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &["DE", "HC"]))
            .with_rule(KNOWLEDGE_ANSWER, "Adults need 7 to 9 hours.")
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let config = OrchestratorConfig::default().with_max_gateway_calls(7);
    let orchestrator = orchestrator_with(gateway.clone(), config);

    let outcome = orchestrator.process_query("How did I sleep?").await.unwrap();

    assert!(!outcome.plan.supporting_agents.contains(&AgentRole::Coach));
    assert!(outcome.plan.supporting_agents.contains(&AgentRole::Knowledge));
    assert!(outcome.notices.iter().any(|n| n.contains("Skipped the coach agent")));
    assert_eq!(outcome.gateway_calls, 7);
    assert_eq!(gateway.calls_matching(COACH_RECOMMEND), 0);
}

#[tokio::test]
async fn test_concurrent_queries_are_serialized() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY)
            .with_latency(Duration::from_millis(5)),
    );
    let orchestrator = orchestrator(gateway);

    let (first, second) = tokio::join!(
        orchestrator.process_query("How did I sleep on Monday?"),
        orchestrator.process_query("How did I sleep on Tuesday?")
    );
    first.unwrap();
    second.unwrap();

    let memory = orchestrator.memory().await;
    assert_eq!(memory.total_turns(), 2);
    let turns = memory.recent_turns(10);
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].turn_index, 1);
    assert_eq!(turns[1].turn_index, 2);
    assert_ne!(turns[0].user_text, turns[1].user_text);
}

#[tokio::test]
async fn test_seeded_memory_reaches_planning_prompt() {
    let gateway = Arc::new(
        analytical_gateway()
            .with_rule(PLAN, plan_json("DS", &[]))
            .with_rule(REFLECTION, APPROVED)
            .with_rule(MEMORY, EMPTY_MEMORY),
    );
    let bundle = bundle();
    let config = OrchestratorConfig::default();
    let memory = Memory::seeded(
        config.memory_limits(),
        bundle.condition_names(),
        bundle.medication_names(),
    );
    let orchestrator = Orchestrator::new(bundle, gateway.clone(), config)
        .unwrap()
        .with_memory(memory);

    orchestrator.process_query("How did I sleep?").await.unwrap();

    let plan_request = &gateway.requests()[0];
    assert!(plan_request.task_instruction.contains(PLAN));
    assert!(plan_request.task_instruction.contains("Pre-hypertension"));
}

#[tokio::test]
async fn test_invalid_budget_is_rejected() {
    let gateway = Arc::new(ScriptedGateway::new());
    let config = OrchestratorConfig::default().with_max_gateway_calls(3);
    let err = Orchestrator::new(bundle(), gateway, config).unwrap_err();
    assert!(matches!(err, OrchestratorError::Configuration(_)));
}
