use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::schema::ToolSpec;

/// A named, schema-validated callable exposed to the remote model.
///
/// Implementations report their own failures inside the returned string so
/// the conversation can continue; `call` never faults. Arguments have
/// already passed schema validation when `call` runs.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> &ToolSpec;
    async fn call(&self, args: Value) -> String;
}

/// Fixed mapping from tool name to implementation, shared read-only by all
/// conversations after setup.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        let name = tool.spec().name.clone();
        if self.tools.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec().clone()).collect()
    }

    /// Validate `args` against the named tool's schema, then dispatch.
    ///
    /// An unknown tool name counts as a validation failure, same as a bad
    /// argument: the caller turns either into a tool-result message instead
    /// of aborting the conversation.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<String> {
        let tool = self.tools.get(name).ok_or_else(|| AgentError::Validation {
            tool: name.to_string(),
            field: "tool".into(),
            constraint: "is not a registered tool".into(),
        })?;

        tool.spec()
            .validate(&args)
            .map_err(|violation| AgentError::Validation {
                tool: name.to_string(),
                field: violation.field,
                constraint: violation.constraint,
            })?;

        Ok(tool.call(args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamSpec;
    use serde_json::json;

    struct EchoTool {
        spec: ToolSpec,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                spec: ToolSpec::new("echo", "Echo the `text` field back")
                    .with_param(ParamSpec::string("text", "Text to echo")),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn call(&self, args: Value) -> String {
            args["text"].as_str().unwrap_or_default().to_string()
        }
    }

    #[tokio::test]
    async fn dispatches_validated_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new()).unwrap();

        let output = registry.invoke("echo", json!({"text": "ping"})).await.unwrap();
        assert_eq!(output, "ping");
    }

    #[tokio::test]
    async fn rejects_duplicate_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new()).unwrap();
        let err = registry.register(EchoTool::new()).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "echo"));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_validation_failure() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation { ref tool, .. } if tool == "missing"));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new()).unwrap();
        let err = registry.invoke("echo", json!({"text": 7})).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Validation { ref field, .. } if field == "text"
        ));
    }
}
