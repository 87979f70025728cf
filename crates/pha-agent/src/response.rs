//! Agent roles and the responses specialists return.

use serde::{Deserialize, Serialize};

/// The specialist roles. Ordering is dispatch priority: earlier roles are
/// kept when supporting agents have to be trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Statistical analysis of personal data.
    Analytical,
    /// Medical and health knowledge.
    Knowledge,
    /// Goal setting and behavior change.
    Coach,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [Self::Analytical, Self::Knowledge, Self::Coach];

    /// Short code used in model-facing JSON.
    pub fn code(self) -> &'static str {
        match self {
            Self::Analytical => "DS",
            Self::Knowledge => "DE",
            Self::Coach => "HC",
        }
    }

    /// Human-readable agent name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Analytical => "Data Science Agent",
            Self::Knowledge => "Domain Expert Agent",
            Self::Coach => "Health Coach Agent",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analytical => write!(f, "analytical"),
            Self::Knowledge => write!(f, "knowledge"),
            Self::Coach => write!(f, "coach"),
        }
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        let normalized = normalized.trim_end_matches("_agent");
        match normalized {
            "ds" | "analytical" | "analyst" | "data_science" | "data_scientist" => {
                Ok(Self::Analytical)
            }
            "de" | "knowledge" | "expert" | "domain_expert" | "medical" => Ok(Self::Knowledge),
            "hc" | "coach" | "health_coach" | "coaching" => Ok(Self::Coach),
            _ => Err(format!("unknown agent: {}", s.trim())),
        }
    }
}

/// Whether generated computation was run. It never is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    NotExecuted,
}

/// Which coaching operation produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingMode {
    GoalDiscovery,
    Recommendation,
    FeedbackAdjustment,
}

impl std::fmt::Display for CoachingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GoalDiscovery => write!(f, "goal discovery"),
            Self::Recommendation => write!(f, "recommendation"),
            Self::FeedbackAdjustment => write!(f, "feedback adjustment"),
        }
    }
}

/// Operation-specific payload of an [`AgentResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseDetail {
    /// Two-stage analysis output.
    Analysis {
        plan: String,
        computation: String,
        execution: ExecutionStatus,
    },
    /// A direct answer.
    Answer,
    /// An answer aggregating other agents' contributions.
    Synthesis { sources: Vec<AgentRole> },
    /// A coaching turn.
    Coaching { mode: CoachingMode },
}

/// Output of one specialist operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Agent that produced the response.
    pub agent: AgentRole,

    /// Operation name (e.g. "answer_question").
    pub operation: String,

    /// User-facing text.
    pub content: String,

    /// Operation-specific payload.
    pub detail: ResponseDetail,
}

impl AgentResponse {
    pub fn new(
        agent: AgentRole,
        operation: impl Into<String>,
        content: impl Into<String>,
        detail: ResponseDetail,
    ) -> Self {
        Self {
            agent,
            operation: operation.into(),
            content: content.into(),
            detail,
        }
    }

    /// A plain answer.
    pub fn answer(agent: AgentRole, operation: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent, operation, content, ResponseDetail::Answer)
    }

    /// An answer built from other agents' contributions.
    pub fn synthesis(
        agent: AgentRole,
        operation: impl Into<String>,
        content: impl Into<String>,
        sources: Vec<AgentRole>,
    ) -> Self {
        Self::new(agent, operation, content, ResponseDetail::Synthesis { sources })
    }

    /// A coaching turn.
    pub fn coaching(operation: impl Into<String>, content: impl Into<String>, mode: CoachingMode) -> Self {
        Self::new(
            AgentRole::Coach,
            operation,
            content,
            ResponseDetail::Coaching { mode },
        )
    }

    /// Check if the response has no visible text.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl std::fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
