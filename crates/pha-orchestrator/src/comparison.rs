//! Side-by-side runs of the orchestrator and the single-agent baseline.

use std::time::{Duration, Instant};

use pha_agent::UnifiedAgent;
use serde::Serialize;
use tracing::info;

use crate::orchestrator::Orchestrator;

/// One system's run of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemRun {
    /// The answer, also set when a later step failed after answering.
    pub answer: Option<String>,
    /// Why the run failed, if it did.
    pub error: Option<String>,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Gateway calls the run made.
    pub gateway_calls: usize,
}

impl SystemRun {
    pub fn succeeded(&self) -> bool {
        self.answer.is_some()
    }
}

/// Both systems on the same query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    /// Query sent to both systems.
    pub query: String,
    /// Run through the orchestrated agent team.
    pub multi_agent: SystemRun,
    /// Run through the single-agent baseline.
    pub unified: SystemRun,
}

impl ComparisonReport {
    /// Multi-agent time over unified time.
    pub fn time_ratio(&self) -> Option<f64> {
        let unified = self.unified.elapsed.as_secs_f64();
        (unified > 0.0).then(|| self.multi_agent.elapsed.as_secs_f64() / unified)
    }

    /// Multi-agent calls over unified calls.
    pub fn call_ratio(&self) -> Option<f64> {
        (self.unified.gateway_calls > 0)
            .then(|| self.multi_agent.gateway_calls as f64 / self.unified.gateway_calls as f64)
    }
}

/// Run `query` through both systems. Failures are captured in the report.
pub async fn compare(
    orchestrator: &Orchestrator,
    unified: &mut UnifiedAgent,
    query: &str,
) -> ComparisonReport {
    let started = Instant::now();
    let multi_agent = match orchestrator.process_query(query).await {
        Ok(outcome) => SystemRun {
            answer: Some(outcome.final_answer),
            error: None,
            elapsed: started.elapsed(),
            gateway_calls: outcome.gateway_calls,
        },
        Err(e) => SystemRun {
            answer: e.final_answer().map(str::to_string),
            error: Some(e.to_string()),
            elapsed: started.elapsed(),
            gateway_calls: orchestrator.gateway_calls(),
        },
    };

    let started = Instant::now();
    let unified = match unified.process_query(query).await {
        Ok(outcome) => SystemRun {
            answer: Some(outcome.answer),
            error: None,
            elapsed: started.elapsed(),
            gateway_calls: outcome.gateway_calls,
        },
        Err(e) => SystemRun {
            answer: None,
            error: Some(e.to_string()),
            elapsed: started.elapsed(),
            gateway_calls: unified.gateway_calls(),
        },
    };

    info!(
        multi_calls = multi_agent.gateway_calls,
        unified_calls = unified.gateway_calls,
        "Comparison complete"
    );

    ComparisonReport {
        query: query.to_string(),
        multi_agent,
        unified,
    }
}
