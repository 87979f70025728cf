//! Terminal rendering of outcomes, memory, and traces.

use pha_agent::{AgentResponse, ResponseDetail};
use pha_core::UserDataBundle;
use pha_memory::Memory;
use pha_orchestrator::{ComparisonReport, ConversationSummary, QueryOutcome, SystemRun};

const RULE_WIDTH: usize = 70;

/// Longest agent response excerpt shown in traces.
const EXCERPT_LEN: usize = 200;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn heading(title: &str) {
    println!("\n{}\n{}\n{}", rule(), title, rule());
}

/// Truncate to `max_len` characters, appending an ellipsis when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

pub fn print_data_summary(bundle: &UserDataBundle) {
    heading("User data");
    println!("{}", bundle.summary_text());
    println!("\nWearable series:\n{}", bundle.wearable_overview());
}

pub fn print_outcome(outcome: &QueryOutcome) {
    println!(
        "\nRouting: {} (main){}",
        outcome.plan.main_agent.label(),
        if outcome.plan.supporting_agents.is_empty() {
            String::new()
        } else {
            format!(
                ", supported by {}",
                outcome
                    .plan
                    .supporting_agents
                    .iter()
                    .map(|r| r.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    );
    for notice in &outcome.notices {
        println!("Note: {notice}");
    }
    println!("\n{}", outcome.final_answer);
}

pub fn print_memory(memory: &Memory) {
    heading("Session memory");
    print_list("Goals", memory.goals());
    print_list("Conditions", memory.conditions());
    print_list("Medications", memory.medications());
    let lifestyle: Vec<String> = memory
        .lifestyle()
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    print_list("Lifestyle", &lifestyle);
    print_list("Key metrics", &memory.key_metrics());
    print_list("Action items", &memory.action_items());
    print_list("Progress notes", &memory.progress_notes());
    println!("Turns recorded: {}", memory.total_turns());
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        println!("{title}: none");
    } else {
        println!("{title}:");
        for item in items {
            println!("  - {item}");
        }
    }
}

pub fn print_summary(summary: &ConversationSummary) {
    heading("Conversation summary");
    println!("Turns: {}", summary.total_turns);
    println!("Goals tracked: {}", summary.goals);
    println!("Action items: {}", summary.action_items);
    for turn in &summary.recent_turns {
        println!(
            "  [{}] You: {}",
            turn.turn_index,
            truncate(&turn.user_text, 60)
        );
        println!("      PHA: {}", truncate(&turn.assistant_text, 60));
    }
}

fn describe_response(response: &AgentResponse) -> String {
    let kind = match &response.detail {
        ResponseDetail::Analysis { execution, .. } => format!("analysis, execution {execution:?}"),
        ResponseDetail::Answer => "answer".to_string(),
        ResponseDetail::Synthesis { sources } => format!(
            "synthesis of {}",
            sources.iter().map(|r| r.code()).collect::<Vec<_>>().join(", ")
        ),
        ResponseDetail::Coaching { mode } => format!("coaching, {mode}"),
    };
    format!(
        "{} [{}] ({}): {}",
        response.agent.code(),
        response.operation,
        kind,
        truncate(&response.content, EXCERPT_LEN)
    )
}

/// Print every step of a traversal.
pub fn print_trace(outcome: &QueryOutcome) {
    heading(&format!("Traversal {}", outcome.traversal_id));
    for record in &outcome.trace {
        println!(
            "Step {} ({}): {} [{} calls, {} ms]",
            record.state.step().unwrap_or_default(),
            record.state,
            record.summary,
            record.gateway_calls,
            record.elapsed.as_millis()
        );
    }

    println!("\nPlan:");
    println!("  intent: {}", outcome.plan.intent);
    println!("  rationale: {}", outcome.plan.rationale);
    for role in outcome.plan.participants() {
        println!("  {}: {}", role.code(), outcome.plan.task_for(role));
    }

    println!("\nResponses:");
    for response in &outcome.agent_responses {
        println!("  {}", describe_response(response));
    }
    for failed in &outcome.failed_agents {
        println!("  {} failed: {}", failed.agent.code(), failed.error);
    }

    println!(
        "\nReview: approved={}, answer {:?}",
        outcome.reflection.approved, outcome.answer_source
    );
    for issue in &outcome.reflection.issues {
        println!("  issue: {issue}");
    }
    if let Some(suggestions) = &outcome.reflection.suggestions {
        println!("  suggestion: {suggestions}");
    }
    println!("Memory: {}", outcome.memory_update);
    println!(
        "Total: {} gateway calls in {} ms",
        outcome.gateway_calls,
        outcome.elapsed.as_millis()
    );
}

fn print_run(title: &str, run: &SystemRun) {
    heading(title);
    if let Some(answer) = &run.answer {
        println!("{answer}");
    }
    if let Some(error) = &run.error {
        println!("Error: {error}");
    }
}

pub fn print_comparison(report: &ComparisonReport, metrics: bool) {
    println!("\nQuery: {}", report.query);
    print_run("Multi-agent team", &report.multi_agent);
    print_run("Single agent", &report.unified);

    if metrics {
        heading("Metrics");
        println!(
            "Multi-agent: {} ms, {} gateway calls",
            report.multi_agent.elapsed.as_millis(),
            report.multi_agent.gateway_calls
        );
        println!(
            "Single agent: {} ms, {} gateway calls",
            report.unified.elapsed.as_millis(),
            report.unified.gateway_calls
        );
        if let Some(ratio) = report.time_ratio() {
            println!("Time ratio: {ratio:.2}x");
        }
        if let Some(ratio) = report.call_ratio() {
            println!("Call ratio: {ratio:.2}x");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_describe_response() {
        let response = AgentResponse::synthesis(
            pha_agent::AgentRole::Analytical,
            "summarize_findings",
            "You slept well.",
            vec![pha_agent::AgentRole::Knowledge],
        );
        assert_eq!(
            describe_response(&response),
            "DS [summarize_findings] (synthesis of DE): You slept well."
        );
    }
}
