use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A structured request from the model to invoke a registered tool.
///
/// The `id` correlates the request with the tool-result message that
/// eventually answers it. Endpoints that do not assign call ids get a
/// generated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
        }
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One entry in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default)]
        tool_calls: Vec<ToolCallRequest>,
    },
    /// Answers a prior [`ToolCallRequest`] identified by `call_id`.
    /// `output` holds the serialized tool result or an error description.
    ToolResult {
        call_id: String,
        tool: String,
        output: String,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Message::Assistant {
            content: None,
            tool_calls: calls,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Message::ToolResult {
            call_id: call_id.into(),
            tool: tool.into(),
            output: output.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self, Message::ToolResult { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_ids_are_unique() {
        let a = ToolCallRequest::new("calculate", json!({}));
        let b = ToolCallRequest::new("calculate", json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn messages_tag_by_role() {
        let serialized = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(serialized["role"], "user");

        let result = Message::tool_result("call_1", "get_weather", "sunny");
        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized["role"], "tool_result");
        assert_eq!(serialized["call_id"], "call_1");
    }
}
