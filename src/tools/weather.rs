use async_trait::async_trait;
use serde_json::Value;

use crate::schema::{ParamSpec, ToolSpec};
use crate::tool::Tool;

/// Mock weather lookup. Returns a fixed-format description for any
/// validated location; there is no external call behind it.
pub struct WeatherTool {
    spec: ToolSpec,
}

impl WeatherTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "get_weather",
                "Get the current weather for a location. Expects {\"location\": string}.",
            )
            .with_param(
                ParamSpec::string("location", "City or place name").with_len(1, 100),
            ),
        }
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, args: Value) -> String {
        let location = args
            .get("location")
            .and_then(Value::as_str)
            .unwrap_or("the requested location");
        format!(
            "The weather in {location} is sunny with a temperature of 22\u{b0}C and a light breeze."
        )
    }
}
