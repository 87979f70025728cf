//! The Step 1 orchestration plan.

use std::collections::{BTreeMap, BTreeSet};

use pha_agent::AgentRole;
use pha_core::{parse_json, ParseError};
use serde::Serialize;
use serde_json::Value;

/// Gateway calls outside Step 2: plan, reflection, memory update.
pub const FIXED_STEP_CALLS: usize = 3;

/// Where a plan came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanOrigin {
    /// Parsed from the model's output.
    Parsed,
    /// The model's output was unusable.
    Fallback { reason: String },
}

/// Which agents answer a query and what each is asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestrationPlan {
    pub intent: String,
    pub main_agent: AgentRole,
    /// Never contains `main_agent`. Ordered by dispatch priority.
    pub supporting_agents: BTreeSet<AgentRole>,
    pub rationale: String,
    pub tasks: BTreeMap<AgentRole, String>,
    pub origin: PlanOrigin,
}

impl OrchestrationPlan {
    /// The plan used when Step 1 output cannot be used: the analytical agent
    /// answers alone.
    pub fn fallback(query: &str, reason: impl Into<String>) -> Self {
        Self {
            intent: query.to_string(),
            main_agent: AgentRole::Analytical,
            supporting_agents: BTreeSet::new(),
            rationale: "Default routing to data analysis".to_string(),
            tasks: BTreeMap::new(),
            origin: PlanOrigin::Fallback {
                reason: reason.into(),
            },
        }
    }

    /// Parse model output strictly.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: Value = parse_json(text)?;
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::Invalid("plan is not a JSON object".into()))?;

        let main_raw = object
            .get("main_agent")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::Invalid("plan has no main_agent".into()))?;
        let main_agent: AgentRole = main_raw.parse().map_err(ParseError::Invalid)?;

        let supporting_agents = match object.get("supporting_agents") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.parse::<AgentRole>().ok())
                .filter(|role| *role != main_agent)
                .collect(),
            Some(Value::String(s)) => s
                .parse::<AgentRole>()
                .ok()
                .filter(|role| *role != main_agent)
                .into_iter()
                .collect(),
            _ => BTreeSet::new(),
        };

        let tasks = match object.get("tasks") {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, value)| {
                    let role = key.parse::<AgentRole>().ok()?;
                    let text = match value {
                        Value::String(s) => s.trim().to_string(),
                        Value::Null => return None,
                        other => other.to_string(),
                    };
                    (!text.is_empty()).then_some((role, text))
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        Ok(Self {
            intent: string_field(object, "user_intent"),
            main_agent,
            supporting_agents,
            rationale: string_field(object, "rationale"),
            tasks,
            origin: PlanOrigin::Parsed,
        })
    }

    /// Parse model output, falling back on any failure.
    pub fn from_model_output(query: &str, text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|e| Self::fallback(query, e.to_string()))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, PlanOrigin::Fallback { .. })
    }

    /// Main agent first, then supporting agents in priority order.
    pub fn participants(&self) -> Vec<AgentRole> {
        std::iter::once(self.main_agent)
            .chain(self.supporting_agents.iter().copied())
            .collect()
    }

    /// Task text for `role`, or the intent when the plan has none.
    pub fn task_for(&self, role: AgentRole) -> &str {
        self.tasks
            .get(&role)
            .map(String::as_str)
            .unwrap_or(&self.intent)
    }

    /// Gateway calls this plan will make over the whole traversal.
    pub fn projected_calls(&self) -> usize {
        let synthesis = usize::from(!self.supporting_agents.is_empty());
        FIXED_STEP_CALLS
            + primary_calls(self.main_agent)
            + self
                .supporting_agents
                .iter()
                .map(|role| primary_calls(*role))
                .sum::<usize>()
            + synthesis
    }

    /// Drop supporting agents, lowest priority first, until the projected
    /// call count fits `budget`. Returns the dropped roles in drop order.
    pub fn trim_to_budget(&mut self, budget: usize) -> Vec<AgentRole> {
        let mut trimmed = Vec::new();
        while self.projected_calls() > budget {
            match self.supporting_agents.pop_last() {
                Some(role) => trimmed.push(role),
                None => break,
            }
        }
        trimmed
    }
}

/// Gateway calls made by a role's primary operation.
pub fn primary_calls(role: AgentRole) -> usize {
    match role {
        AgentRole::Analytical => 2,
        AgentRole::Knowledge | AgentRole::Coach => 1,
    }
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"```json
{
    "user_intent": "Understand sleep over the last month",
    "main_agent": "DS",
    "supporting_agents": ["DE", "HC", "DS", "nutritionist"],
    "rationale": "Needs personal data",
    "tasks": {
        "DS": "Compute average sleep",
        "DE": "Interpret sleep duration",
        "HC": "",
        "XX": "ignored"
    }
}
```"#;

    #[test]
    fn test_parse_plan() {
        let plan = OrchestrationPlan::parse(PLAN).unwrap();
        assert_eq!(plan.main_agent, AgentRole::Analytical);
        assert_eq!(
            plan.supporting_agents.iter().copied().collect::<Vec<_>>(),
            vec![AgentRole::Knowledge, AgentRole::Coach]
        );
        assert_eq!(plan.task_for(AgentRole::Analytical), "Compute average sleep");
        assert_eq!(plan.task_for(AgentRole::Coach), "Understand sleep over the last month");
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.origin, PlanOrigin::Parsed);
        assert_eq!(
            plan.participants(),
            vec![AgentRole::Analytical, AgentRole::Knowledge, AgentRole::Coach]
        );
    }

    #[test]
    fn test_malformed_output_falls_back() {
        for text in ["Sure! I'd route this to the data agent.", "{\"main_agent\": ", "[1, 2]"] {
            let plan = OrchestrationPlan::from_model_output("How did I sleep?", text);
            assert!(plan.is_fallback(), "{text:?} should fall back");
            assert_eq!(plan.main_agent, AgentRole::Analytical);
            assert!(plan.supporting_agents.is_empty());
        }
    }

    #[test]
    fn test_unknown_main_agent_falls_back() {
        let plan = OrchestrationPlan::from_model_output(
            "q",
            r#"{"main_agent": "Nutritionist", "supporting_agents": ["DE"]}"#,
        );
        match &plan.origin {
            PlanOrigin::Fallback { reason } => assert!(reason.contains("Nutritionist")),
            PlanOrigin::Parsed => panic!("expected fallback"),
        }
        assert!(plan.supporting_agents.is_empty());
    }

    #[test]
    fn test_projected_calls() {
        let mut plan = OrchestrationPlan::parse(PLAN).unwrap();
        // 3 fixed + 2 analytical + 1 knowledge + 1 coach + 1 synthesis
        assert_eq!(plan.projected_calls(), 8);

        plan.supporting_agents.clear();
        assert_eq!(plan.projected_calls(), 5);
        assert_eq!(OrchestrationPlan::fallback("q", "r").projected_calls(), 5);
    }

    #[test]
    fn test_trim_to_budget_drops_lowest_priority_first() {
        let mut plan = OrchestrationPlan::parse(PLAN).unwrap();
        assert!(plan.trim_to_budget(10).is_empty());

        assert_eq!(plan.trim_to_budget(7), vec![AgentRole::Coach]);
        assert_eq!(plan.projected_calls(), 7);

        assert_eq!(plan.trim_to_budget(5), vec![AgentRole::Knowledge]);
        assert!(plan.supporting_agents.is_empty());
    }
}
