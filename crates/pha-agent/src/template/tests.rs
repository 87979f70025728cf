//! Tests for the prompt template module.

use super::*;

fn vars_for(name: TemplateName) -> PromptVars {
    let registry = PromptRegistry::new();
    registry
        .placeholders(name)
        .unwrap()
        .into_iter()
        .fold(PromptVars::new(), |vars, var| {
            let value = format!("<{var}>");
            vars.with(var, value)
        })
}

#[test]
fn test_template_name_display() {
    assert_eq!(TemplateName::TaskAssignment.to_string(), "task_assignment");
    assert_eq!(TemplateName::CoachFeedback.to_string(), "coach_feedback");
}

#[test]
fn test_template_name_from_str() {
    assert_eq!(
        "reflection".parse::<TemplateName>().unwrap(),
        TemplateName::Reflection
    );
    assert_eq!(
        "does_not_exist".parse::<TemplateName>(),
        Err(TemplateError::UnknownTemplate("does_not_exist".into()))
    );
}

#[test]
fn test_every_template_registered() {
    let registry = PromptRegistry::new();
    for name in TemplateName::ALL {
        assert!(!registry.get(name).unwrap().is_empty(), "{name} is empty");
    }
}

#[test]
fn test_placeholders() {
    let registry = PromptRegistry::new();
    assert_eq!(
        registry.placeholders(TemplateName::TaskAssignment).unwrap(),
        vec!["user_query", "conversation_history", "memory"]
    );
    assert!(registry
        .placeholders(TemplateName::OrchestratorRole)
        .unwrap()
        .is_empty());
}

#[test]
fn test_placeholder_pattern_compiles() {
    let regex = placeholder_regex().unwrap();
    assert!(regex.is_match("{{ user_query }}"));
    assert!(regex.is_match("{{task}}"));
    assert!(!regex.is_match("{{ 1bad }}"));
}

#[test]
fn test_coach_recommend_carries_query_and_task() {
    let registry = PromptRegistry::new();
    let names = registry.placeholders(TemplateName::CoachRecommend).unwrap();
    assert!(names.iter().any(|n| n == "user_query"));
    assert!(names.iter().any(|n| n == "task"));
}

#[test]
fn test_render_substitutes_all() {
    let registry = PromptRegistry::new();
    for name in TemplateName::ALL {
        let rendered = registry.render(name, &vars_for(name)).unwrap();
        assert!(!rendered.contains("{{"), "{name} left a placeholder");
    }
}

#[test]
fn test_render_is_deterministic() {
    let registry = PromptRegistry::global();
    let vars = PromptVars::new()
        .with("user_query", "How has my sleep been this month?")
        .with("conversation_history", "No previous conversation")
        .with("memory", "{}");

    let first = registry.render(TemplateName::TaskAssignment, &vars).unwrap();
    let second = registry.render(TemplateName::TaskAssignment, &vars).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
    assert!(first.contains("**User Query:** How has my sleep been this month?"));
}

#[test]
fn test_missing_variable() {
    let registry = PromptRegistry::new();
    let err = registry
        .render(TemplateName::AnalysisPlan, &PromptVars::new())
        .unwrap_err();
    assert_eq!(
        err,
        TemplateError::MissingVariable {
            template: "analysis_plan".into(),
            variable: "user_query".into(),
        }
    );
}

#[test]
fn test_extra_variables_ignored() {
    let registry = PromptRegistry::new();
    let vars = PromptVars::new()
        .with("user_query", "q")
        .with("unused", "ignored");
    let rendered = registry.render(TemplateName::AnalysisPlan, &vars).unwrap();
    assert!(!rendered.contains("ignored"));
}

#[test]
fn test_values_are_not_reexpanded() {
    let registry = PromptRegistry::new();
    let vars = PromptVars::new().with("user_query", "{{ memory }}");
    let rendered = registry.render(TemplateName::AnalysisPlan, &vars).unwrap();
    assert!(rendered.contains("User Query: {{ memory }}"));
}

#[test]
fn test_render_named() {
    let registry = PromptRegistry::new();
    let rendered = registry
        .render_named("analysis_plan", &PromptVars::new().with("user_query", "q"))
        .unwrap();
    assert!(rendered.starts_with("Analyze this user query"));
    assert!(registry
        .render_named("missing", &PromptVars::new())
        .is_err());
}
