//! Orchestration layer for the Personal Health Agent.
//!
//! This crate provides the [`Orchestrator`], which routes each user query
//! through the three specialists in four steps and keeps the session memory.
//!
//! # Overview
//!
//! A traversal runs:
//! 1. Understanding: one call produces an [`OrchestrationPlan`]
//! 2. Dispatching: the main agent and its supporting agents run concurrently,
//!    then the main agent synthesizes their output
//! 3. Reflecting: one call reviews the proposed answer
//! 4. Memory update: one call extracts entities to merge into memory
//!
//! Supporting agent failures, unusable plans and unusable reviews are
//! absorbed and reported as notices. A main agent failure ends the
//! traversal.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pha_agent::{build_gateway, ModelConfig};
//! use pha_core::MockDataGenerator;
//! use pha_orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let gateway = build_gateway(&ModelConfig::from_env()?)?;
//! let bundle = Arc::new(MockDataGenerator::default().generate());
//! let orchestrator = Orchestrator::new(bundle, gateway, OrchestratorConfig::from_env()?)?;
//!
//! let outcome = orchestrator.process_query("How has my sleep been?").await?;
//! println!("{}", outcome.final_answer);
//! ```

pub mod comparison;
pub mod config;
pub mod dispatch;
mod error;
mod orchestrator;
pub mod plan;
pub mod reflection;

pub use comparison::{compare, ComparisonReport, SystemRun};
pub use config::{OrchestratorConfig, DEFAULT_MAX_GATEWAY_CALLS, MIN_TRAVERSAL_CALLS};
pub use dispatch::{DispatchOutcome, FailedAgent, SpecialistPool};
pub use error::{OrchestratorError, Result};
pub use orchestrator::{
    ConversationSummary, Orchestrator, OrchestratorState, QueryOutcome, StepRecord,
};
pub use plan::{OrchestrationPlan, PlanOrigin};
pub use reflection::{AnswerSource, ReflectionOrigin, ReflectionResult};

// Re-export commonly used types from pha-agent
pub use pha_agent::{AgentResponse, AgentRole, UnifiedAgent, UnifiedOutcome};
