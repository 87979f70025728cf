//! LLM gateway, prompts, and specialist agents for the Personal Health Agent.
//!
//! # Overview
//!
//! - **Gateway**: the single seam through which every model call passes,
//!   with Gemini and OpenRouter clients and a call-counting wrapper.
//! - **Templates**: an immutable registry of named prompts.
//! - **Specialists**: the analytical, knowledge, and coach agents, each with
//!   a read-only slice of the user's data and a private conversation log.
//! - **Unified agent**: a single-agent baseline for comparison.
//!
//! # Core Types
//!
//! - [`Gateway`]: text completion backend
//! - [`CompletionRequest`]: role + task instruction with sampling parameters
//! - [`MeteredGateway`]: counts and caps calls
//! - [`ModelConfig`]: model, provider, token cap, timeout
//! - [`AgentRole`]: the three specialist roles
//! - [`AgentResponse`]: output of a specialist operation
//! - [`UnifiedAgent`]: the baseline
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pha_agent::{build_gateway, KnowledgeAgent, ModelConfig};
//! use pha_core::MockDataGenerator;
//!
//! let gateway = build_gateway(&ModelConfig::from_env()?)?;
//! let bundle = Arc::new(MockDataGenerator::default().generate());
//! let mut expert = KnowledgeAgent::new(bundle, gateway)?;
//! let response = expert.answer_question("Is my LDL in range?").await?;
//! println!("{}", response);
//! ```

pub mod analytical;
pub mod client;
pub mod coach;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod knowledge;
pub mod response;
pub mod specialist;
pub mod template;
pub mod unified_agent;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used items
pub use analytical::{AnalysisReport, AnalyticalAgent};
pub use client::{build_gateway, GeminiClient, OpenRouterClient};
pub use coach::CoachAgent;
pub use config::{ModelConfig, Provider};
pub use context::{ConversationLog, Exchange};
pub use error::{AgentError, GatewayError, Result, TemplateError};
pub use gateway::{CompletionRequest, Gateway, MeteredGateway, SharedGateway};
pub use knowledge::KnowledgeAgent;
pub use response::{AgentResponse, AgentRole, CoachingMode, ExecutionStatus, ResponseDetail};
pub use specialist::SpecialistCore;
pub use template::{PromptRegistry, PromptVars, TemplateName};
pub use unified_agent::{UnifiedAgent, UnifiedOutcome};
