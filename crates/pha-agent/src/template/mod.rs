//! Prompt templates.
//!
//! Every prompt the system sends is a named template with `{{ name }}`
//! placeholders. The [`PromptRegistry`] is built once and never mutated;
//! rendering is pure, so identical inputs give byte-identical prompts.
//!
//! # Example
//!
//! ```
//! use pha_agent::template::{PromptRegistry, PromptVars, TemplateName};
//!
//! let registry = PromptRegistry::global();
//! let prompt = registry
//!     .render(
//!         TemplateName::AnalysisPlan,
//!         &PromptVars::new().with("user_query", "How did I sleep?"),
//!     )
//!     .unwrap();
//!
//! assert!(prompt.contains("How did I sleep?"));
//! ```

mod prompts;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Matches `{{ name }}` with optional inner whitespace.
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// Names of every registered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateName {
    OrchestratorRole,
    TaskAssignment,
    Reflection,
    MemoryUpdate,
    AnalyticalRole,
    AnalysisPlan,
    Computation,
    AnalyticalSummary,
    KnowledgeRole,
    KnowledgeAnswer,
    KnowledgeSynthesis,
    CoachRole,
    CoachGoals,
    CoachRecommend,
    CoachFeedback,
    UnifiedRole,
    UnifiedMemoryUpdate,
}

impl TemplateName {
    /// All template names in declaration order.
    pub const ALL: [TemplateName; 17] = [
        Self::OrchestratorRole,
        Self::TaskAssignment,
        Self::Reflection,
        Self::MemoryUpdate,
        Self::AnalyticalRole,
        Self::AnalysisPlan,
        Self::Computation,
        Self::AnalyticalSummary,
        Self::KnowledgeRole,
        Self::KnowledgeAnswer,
        Self::KnowledgeSynthesis,
        Self::CoachRole,
        Self::CoachGoals,
        Self::CoachRecommend,
        Self::CoachFeedback,
        Self::UnifiedRole,
        Self::UnifiedMemoryUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrchestratorRole => "orchestrator_role",
            Self::TaskAssignment => "task_assignment",
            Self::Reflection => "reflection",
            Self::MemoryUpdate => "memory_update",
            Self::AnalyticalRole => "analytical_role",
            Self::AnalysisPlan => "analysis_plan",
            Self::Computation => "computation",
            Self::AnalyticalSummary => "analytical_summary",
            Self::KnowledgeRole => "knowledge_role",
            Self::KnowledgeAnswer => "knowledge_answer",
            Self::KnowledgeSynthesis => "knowledge_synthesis",
            Self::CoachRole => "coach_role",
            Self::CoachGoals => "coach_goals",
            Self::CoachRecommend => "coach_recommend",
            Self::CoachFeedback => "coach_feedback",
            Self::UnifiedRole => "unified_role",
            Self::UnifiedMemoryUpdate => "unified_memory_update",
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::OrchestratorRole => prompts::ORCHESTRATOR_ROLE,
            Self::TaskAssignment => prompts::TASK_ASSIGNMENT,
            Self::Reflection => prompts::REFLECTION,
            Self::MemoryUpdate => prompts::MEMORY_UPDATE,
            Self::AnalyticalRole => prompts::ANALYTICAL_ROLE,
            Self::AnalysisPlan => prompts::ANALYSIS_PLAN,
            Self::Computation => prompts::COMPUTATION,
            Self::AnalyticalSummary => prompts::ANALYTICAL_SUMMARY,
            Self::KnowledgeRole => prompts::KNOWLEDGE_ROLE,
            Self::KnowledgeAnswer => prompts::KNOWLEDGE_ANSWER,
            Self::KnowledgeSynthesis => prompts::KNOWLEDGE_SYNTHESIS,
            Self::CoachRole => prompts::COACH_ROLE,
            Self::CoachGoals => prompts::COACH_GOALS,
            Self::CoachRecommend => prompts::COACH_RECOMMEND,
            Self::CoachFeedback => prompts::COACH_FEEDBACK,
            Self::UnifiedRole => prompts::UNIFIED_ROLE,
            Self::UnifiedMemoryUpdate => prompts::UNIFIED_MEMORY_UPDATE,
        }
    }
}

impl std::fmt::Display for TemplateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateName {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownTemplate(s.to_string()))
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptVars {
    values: BTreeMap<String, String>,
}

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value (builder form).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

fn placeholder_regex() -> Result<&'static Regex, TemplateError> {
    static PATTERN: OnceLock<Result<Regex, String>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| TemplateError::Pattern(e.clone()))
}

/// Immutable map of template name to template text.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    templates: HashMap<TemplateName, &'static str>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRegistry {
    /// Build a registry holding every built-in template.
    pub fn new() -> Self {
        Self {
            templates: TemplateName::ALL
                .into_iter()
                .map(|name| (name, name.text()))
                .collect(),
        }
    }

    /// The process-wide registry, built on first use.
    pub fn global() -> &'static PromptRegistry {
        static REGISTRY: OnceLock<PromptRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PromptRegistry::new)
    }

    /// Raw template text.
    pub fn get(&self, name: TemplateName) -> Result<&'static str, TemplateError> {
        self.templates
            .get(&name)
            .copied()
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))
    }

    /// Render a template by its string name.
    pub fn render_named(&self, name: &str, vars: &PromptVars) -> Result<String, TemplateError> {
        self.render(name.parse()?, vars)
    }

    /// Distinct placeholders of a template, in order of first appearance.
    pub fn placeholders(&self, name: TemplateName) -> Result<Vec<String>, TemplateError> {
        let text = self.get(name)?;
        let mut names: Vec<String> = Vec::new();
        for caps in placeholder_regex()?.captures_iter(text) {
            let var = &caps[1];
            if !names.iter().any(|n| n == var) {
                names.push(var.to_string());
            }
        }
        Ok(names)
    }

    /// Substitute every placeholder. Extra variables are ignored.
    pub fn render(&self, name: TemplateName, vars: &PromptVars) -> Result<String, TemplateError> {
        let text = self.get(name)?;
        for variable in self.placeholders(name)? {
            if vars.get(&variable).is_none() {
                return Err(TemplateError::MissingVariable {
                    template: name.to_string(),
                    variable,
                });
            }
        }

        let rendered = placeholder_regex()?.replace_all(text, |caps: &regex::Captures<'_>| {
            vars.get(&caps[1]).unwrap_or_default().to_string()
        });
        Ok(rendered.into_owned())
    }
}
