//! A scripted gateway for tests.
//!
//! Replies are chosen by the first rule whose needle occurs in the task
//! instruction. Every request is recorded, including failed ones.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::gateway::{CompletionRequest, Gateway};

const SCRIPTED_PROVIDER: &str = "scripted";

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(GatewayError),
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    reply: Reply,
}

/// Gateway returning canned text keyed by task-instruction substrings.
#[derive(Debug)]
pub struct ScriptedGateway {
    rules: Vec<Rule>,
    default_reply: Reply,
    latency: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    /// No rules; unmatched requests get `"OK"`.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_reply: Reply::Text("OK".to_string()),
            latency: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` when the task contains `needle`.
    pub fn with_rule(mut self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Text(text.into()),
        });
        self
    }

    /// Fail with `error` when the task contains `needle`.
    pub fn with_failure(mut self, needle: impl Into<String>, error: GatewayError) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Fail(error),
        });
        self
    }

    /// Fail with an upstream 500 when the task contains `needle`.
    pub fn failing_on(self, needle: impl Into<String>) -> Self {
        self.with_failure(
            needle,
            GatewayError::Upstream {
                provider: SCRIPTED_PROVIDER.to_string(),
                status: Some(500),
                message: "scripted failure".to_string(),
            },
        )
    }

    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default_reply = Reply::Text(text.into());
        self
    }

    /// Sleep this long before answering each request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Requests whose task contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.task_instruction.contains(needle))
            .count()
    }

    fn reply_for(&self, task: &str) -> Reply {
        self.rules
            .iter()
            .find(|rule| task.contains(&rule.needle))
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.reply_for(&request.task_instruction) {
            Reply::Text(text) => Ok(text),
            Reply::Fail(error) => Err(error),
        }
    }

    fn model_id(&self) -> &str {
        SCRIPTED_PROVIDER
    }
}
