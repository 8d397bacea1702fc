//! Building blocks for a tool-calling agent over a remote chat model.
//!
//! The crate provides a minimal runtime with:
//! - A chat model abstraction (`ChatModel`) over OpenAI-compatible endpoints.
//! - Schema-validated tools (`ToolSpec`, `Tool`, `ToolRegistry`) with stock
//!   weather and calculator implementations.
//! - An `Agent` that loops between the model and tools until the model
//!   answers or a turn budget runs out.
//! - An `Evaluator` that scores the finished transcript with a second model
//!   pass.

mod agent;
mod config;
mod error;
mod eval;
mod llm;
mod message;
mod schema;
mod telemetry;
mod tool;
pub mod tools;
mod transcript;

pub use agent::{Agent, AgentRun};
pub use config::{AgentSettings, AppConfig, ModelConfig};
pub use error::{AgentError, Result};
pub use eval::{EvaluationVerdict, Evaluator};
pub use llm::{ChatModel, ModelResponse, OpenAiCompatClient, ScriptedModel};
pub use message::{Message, ToolCallRequest};
pub use schema::{ParamSpec, ParamType, SchemaViolation, ToolSpec};
pub use telemetry::{FailureRecord, TelemetryCollector, TelemetryEvent};
pub use tool::{Tool, ToolRegistry};
pub use tools::builtin_toolkit;
pub use transcript::Transcript;
