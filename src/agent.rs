use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::llm::{ChatModel, ModelResponse};
use crate::message::Message;
use crate::telemetry::TelemetryCollector;
use crate::tool::ToolRegistry;
use crate::transcript::Transcript;

/// A finished conversation: the closing answer plus the full transcript
/// that produced it.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub answer: String,
    pub transcript: Transcript,
}

/// Drives the turn loop: consult the model, dispatch any requested tools,
/// feed the results back, repeat until the model answers or the turn
/// budget runs out.
///
/// Each `run` owns its transcript; one agent can serve independent
/// conversations concurrently.
pub struct Agent<M: ChatModel> {
    model: Arc<M>,
    tools: ToolRegistry,
    system_prompt: String,
    max_turns: usize,
    telemetry: Option<TelemetryCollector>,
}

impl<M: ChatModel> std::fmt::Debug for Agent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("system_prompt", &self.system_prompt)
            .field("max_turns", &self.max_turns)
            .finish_non_exhaustive()
    }
}

impl<M: ChatModel> Agent<M> {
    /// Fails with a configuration error when the model was not declared
    /// tool-capable, before any turn begins.
    pub fn new(model: Arc<M>, tools: ToolRegistry) -> Result<Self> {
        if !model.supports_tools() {
            return Err(AgentError::Configuration(
                "model is not declared tool-capable; structured tool output is required".into(),
            ));
        }
        Ok(Self {
            model,
            tools,
            system_prompt: "You are a helpful assistant. Use the available tools when they apply."
                .to_string(),
            max_turns: 6,
            telemetry: None,
        })
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Run one conversation to completion.
    ///
    /// Tool validation failures and tool faults are absorbed into the
    /// transcript as tool-result messages. Only endpoint failures and the
    /// turn-limit guard escape as errors.
    pub async fn run(&self, user_input: impl Into<String>) -> Result<AgentRun> {
        let mut transcript = Transcript::default();
        transcript.push(Message::user(user_input));

        let specs = self.tools.specs();

        for turn in 0..self.max_turns {
            debug_assert!(transcript.awaiting_model());
            if let Some(telemetry) = &self.telemetry {
                telemetry.record("model_turn", json!({"turn": turn}));
            }

            let response = self
                .model
                .complete_with_tools(&self.system_prompt, transcript.messages(), &specs)
                .await?;

            match response {
                ModelResponse::FinalAnswer(answer) => {
                    debug!(turn, "model produced final answer");
                    transcript.push(Message::assistant(&answer));
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record("final_answer", json!({"turns_used": turn + 1}));
                    }
                    return Ok(AgentRun { answer, transcript });
                }
                ModelResponse::ToolCalls(calls) => {
                    debug!(turn, count = calls.len(), "model requested tool calls");
                    transcript.push(Message::tool_calls(calls.clone()));

                    // Dispatch in request order; each call's outcome is
                    // independent and always yields a tool-result message.
                    for call in calls {
                        let output = match self
                            .tools
                            .invoke(&call.name, call.arguments.clone())
                            .await
                        {
                            Ok(text) => {
                                if let Some(telemetry) = &self.telemetry {
                                    telemetry.record(
                                        "tool_dispatch",
                                        json!({"tool": call.name.clone()}),
                                    );
                                }
                                text
                            }
                            Err(err @ AgentError::Validation { .. }) => {
                                if let Some(telemetry) = &self.telemetry {
                                    telemetry
                                        .record_failure(format!("tool::{}", call.name), err.to_string());
                                }
                                err.to_string()
                            }
                            Err(err) => return Err(err),
                        };
                        transcript.push(Message::tool_result(&call.id, &call.name, output));
                    }
                }
            }
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.record_failure("agent", "turn limit exceeded");
        }
        Err(AgentError::TurnLimitExceeded {
            limit: self.max_turns,
            transcript,
        })
    }
}
