//! Inference client abstractions and implementations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCallRequest};
use crate::schema::ToolSpec;

/// Outcome of one tool-aware completion: either the model is done, or it
/// wants one or more tools invoked before it continues.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    FinalAnswer(String),
    ToolCalls(Vec<ToolCallRequest>),
}

/// Thin wrapper around a remote chat-completion endpoint.
///
/// Both methods are single blocking round-trips: no retry, no streaming.
/// Implementations must be safe to share across independent conversations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Tool-aware completion. Requires a tool-capable model.
    async fn complete_with_tools(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse>;

    /// Free-text completion, used for evaluation.
    async fn complete_plain(&self, prompt: &str) -> Result<String>;

    /// Whether the configured model was declared capable of native
    /// structured tool output. There is no free-text parsing fallback.
    fn supports_tools(&self) -> bool;
}

fn endpoint_error(status: reqwest::StatusCode, body: &str) -> AgentError {
    AgentError::RemoteUnavailable(format!("endpoint returned {status}: {body}"))
}

/// Client for OpenAI-compatible `/chat/completions` servers (vLLM,
/// llama.cpp, OpenAI itself). Auth is optional since local inference
/// servers usually run without keys.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
    tool_capable: bool,
}

impl OpenAiCompatClient {
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| AgentError::Configuration(format!("http client error: {err}")))?;
        Ok(Self {
            http,
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            tool_capable: cfg.supports_tools,
        })
    }

    fn to_wire_messages(system: &str, messages: &[Message]) -> Vec<WireMessage> {
        let mut built = vec![WireMessage {
            role: "system".into(),
            content: Some(system.to_string()),
            tool_call_id: None,
            tool_calls: None,
        }];
        for message in messages {
            built.push(match message {
                Message::User { content } => WireMessage {
                    role: "user".into(),
                    content: Some(content.clone()),
                    tool_call_id: None,
                    tool_calls: None,
                },
                Message::Assistant {
                    content,
                    tool_calls,
                } => WireMessage {
                    role: "assistant".into(),
                    content: content.clone(),
                    tool_call_id: None,
                    tool_calls: if tool_calls.is_empty() {
                        None
                    } else {
                        Some(
                            tool_calls
                                .iter()
                                .map(|call| WireToolCall {
                                    id: Some(call.id.clone()),
                                    r#type: "function".into(),
                                    function: WireFunctionCall {
                                        name: call.name.clone(),
                                        arguments: serialize_arguments(&call.arguments),
                                    },
                                })
                                .collect(),
                        )
                    },
                },
                Message::ToolResult {
                    call_id,
                    tool: _,
                    output,
                } => WireMessage {
                    role: "tool".into(),
                    content: Some(output.clone()),
                    tool_call_id: Some(call_id.clone()),
                    tool_calls: None,
                },
            });
        }
        built
    }

    fn to_wire_tools(tools: &[ToolSpec]) -> Option<Vec<WireTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|spec| WireTool {
                    r#type: "function".into(),
                    function: WireFunction {
                        name: spec.name.clone(),
                        description: Some(spec.description.clone()),
                        parameters: Some(spec.to_json_schema()),
                    },
                })
                .collect(),
        )
    }

    /// Request body for a tool-aware completion. `tools` and `tool_choice`
    /// are omitted entirely when the registry is empty; some compatible
    /// servers reject explicit nulls where they accept absent keys.
    fn chat_payload(&self, system: &str, messages: &[Message], tools: &[ToolSpec]) -> Value {
        let mut payload = Map::new();
        payload.insert("model".into(), json!(self.model));
        payload.insert(
            "messages".into(),
            json!(Self::to_wire_messages(system, messages)),
        );
        if let Some(wire_tools) = Self::to_wire_tools(tools) {
            payload.insert("tools".into(), json!(wire_tools));
            payload.insert("tool_choice".into(), json!("auto"));
        }
        payload.insert("stream".into(), json!(false));
        Value::Object(payload)
    }

    async fn post_chat(&self, payload: Value) -> Result<WireResponse> {
        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("Bearer {key}"));
        }
        let resp = builder
            .json(&payload)
            .send()
            .await
            .map_err(|err| AgentError::RemoteUnavailable(format!("request error: {err}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(endpoint_error(status, &body));
        }

        resp.json()
            .await
            .map_err(|err| AgentError::RemoteUnavailable(format!("response parse error: {err}")))
    }

    fn first_choice(body: WireResponse) -> Result<WireChoiceMessage> {
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::RemoteUnavailable("endpoint returned no choices".into()))
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete_with_tools(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse> {
        if !self.tool_capable {
            return Err(AgentError::Configuration(format!(
                "model `{}` was not declared tool-capable",
                self.model
            )));
        }

        let payload = self.chat_payload(system, messages, tools);
        let message = Self::first_choice(self.post_chat(payload).await?)?;

        let mut calls = Vec::new();
        for call in message.tool_calls.unwrap_or_default() {
            // Model output is untrusted: argument strings that fail to parse
            // are carried through as-is and rejected by schema validation.
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
            calls.push(match call.id {
                Some(id) => ToolCallRequest::with_id(id, call.function.name, arguments),
                None => ToolCallRequest::new(call.function.name, arguments),
            });
        }

        if calls.is_empty() {
            Ok(ModelResponse::FinalAnswer(
                message.content.unwrap_or_default(),
            ))
        } else {
            Ok(ModelResponse::ToolCalls(calls))
        }
    }

    async fn complete_plain(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });
        let message = Self::first_choice(self.post_chat(payload).await?)?;
        Ok(message.content.unwrap_or_default())
    }

    fn supports_tools(&self) -> bool {
        self.tool_capable
    }
}

/// Deterministic model that replays scripted responses, for tests and
/// demos.
///
/// Tool-aware calls pop a JSON directive:
/// `{"action":"respond","content":"..."}` or
/// `{"action":"call_tools","calls":[{"name":"...","arguments":{...}}]}`.
/// Anything that does not parse becomes a final answer verbatim. Plain
/// calls pop the next entry untouched.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    tool_capable: bool,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            tool_capable: true,
        })
    }

    /// A scripted model that claims no native tool support, for exercising
    /// setup rejection.
    pub fn without_tool_support() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            tool_capable: false,
        })
    }

    fn pop(&self) -> Result<String> {
        let mut locked = self
            .responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locked.pop_front().ok_or_else(|| {
            AgentError::RemoteUnavailable("scripted model ran out of responses".into())
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ScriptedDirective {
    Respond { content: String },
    CallTools { calls: Vec<ScriptedCall> },
}

#[derive(Debug, Deserialize)]
struct ScriptedCall {
    name: String,
    arguments: Value,
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete_with_tools(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<ModelResponse> {
        let raw = self.pop()?;
        match serde_json::from_str::<ScriptedDirective>(&raw) {
            Ok(ScriptedDirective::Respond { content }) => Ok(ModelResponse::FinalAnswer(content)),
            Ok(ScriptedDirective::CallTools { calls }) => Ok(ModelResponse::ToolCalls(
                calls
                    .into_iter()
                    .map(|call| ToolCallRequest::new(call.name, call.arguments))
                    .collect(),
            )),
            Err(_) => Ok(ModelResponse::FinalAnswer(raw)),
        }
    }

    async fn complete_plain(&self, _prompt: &str) -> Result<String> {
        self.pop()
    }

    fn supports_tools(&self) -> bool {
        self.tool_capable
    }
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    r#type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    r#type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

fn serialize_arguments(args: &Value) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| args.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_model_replays_directives() {
        let model = ScriptedModel::new([
            r#"{"action":"call_tools","calls":[{"name":"get_weather","arguments":{"location":"Oslo"}}]}"#,
            r#"{"action":"respond","content":"done"}"#,
        ]);

        let first = model.complete_with_tools("", &[], &[]).await.unwrap();
        match first {
            ModelResponse::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "get_weather");
                assert_eq!(calls[0].arguments, json!({"location": "Oslo"}));
            }
            other => panic!("expected tool calls, got {other:?}"),
        }

        let second = model.complete_with_tools("", &[], &[]).await.unwrap();
        assert_eq!(second, ModelResponse::FinalAnswer("done".into()));

        let exhausted = model.complete_with_tools("", &[], &[]).await.unwrap_err();
        assert!(matches!(exhausted, AgentError::RemoteUnavailable(_)));
    }

    #[tokio::test]
    async fn scripted_plain_completion_is_verbatim() {
        let model = ScriptedModel::new(["free text"]);
        assert_eq!(model.complete_plain("prompt").await.unwrap(), "free text");
    }

    #[test]
    fn chat_payload_omits_tool_keys_for_an_empty_registry() {
        use crate::config::ModelConfig;
        use crate::schema::{ParamSpec, ToolSpec};

        let client = OpenAiCompatClient::from_config(&ModelConfig::default()).unwrap();
        let messages = vec![Message::user("hi")];

        let bare = client.chat_payload("be helpful", &messages, &[]);
        let object = bare.as_object().unwrap();
        assert!(!object.contains_key("tools"));
        assert!(!object.contains_key("tool_choice"));
        assert_eq!(bare["stream"], false);

        let spec = ToolSpec::new("get_weather", "Look up the weather")
            .with_param(ParamSpec::string("location", "City name").with_len(1, 100));
        let with_tools = client.chat_payload("be helpful", &messages, &[spec]);
        assert_eq!(with_tools["tool_choice"], "auto");
        assert_eq!(
            with_tools["tools"][0]["function"]["name"],
            "get_weather"
        );
    }

    #[test]
    fn wire_messages_carry_tool_plumbing() {
        let messages = vec![
            Message::user("hi"),
            Message::tool_calls(vec![ToolCallRequest::with_id(
                "call_0",
                "calculate",
                json!({"operation": "add", "a": 1, "b": 2}),
            )]),
            Message::tool_result("call_0", "calculate", "3"),
        ];
        let wire = OpenAiCompatClient::to_wire_messages("be helpful", &messages);

        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[2].tool_calls.as_ref().unwrap()[0].function.name, "calculate");
        assert_eq!(wire[3].role, "tool");
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("call_0"));
    }
}
