use async_trait::async_trait;
use serde_json::Value;

use crate::schema::{ParamSpec, ToolSpec};
use crate::tool::Tool;

const OPERATIONS: [&str; 4] = ["add", "subtract", "multiply", "divide"];

/// Basic four-operation calculator. Division by zero is reported inside the
/// result string, never raised.
pub struct CalculatorTool {
    spec: ToolSpec,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "calculate",
                "Perform basic arithmetic. Expects {\"operation\": \"add\"|\"subtract\"|\"multiply\"|\"divide\", \"a\": number, \"b\": number}.",
            )
            .with_param(ParamSpec::one_of(
                "operation",
                OPERATIONS,
                "Arithmetic operation to apply",
            ))
            .with_param(ParamSpec::number("a", "First operand"))
            .with_param(ParamSpec::number("b", "Second operand")),
        }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, args: Value) -> String {
        let operation = args
            .get("operation")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let a = args.get("a").and_then(Value::as_f64).unwrap_or_default();
        let b = args.get("b").and_then(Value::as_f64).unwrap_or_default();

        match operation {
            "add" => format!("The result of adding {a} and {b} is {}.", a + b),
            "subtract" => format!("The result of subtracting {b} from {a} is {}.", a - b),
            "multiply" => format!("The result of multiplying {a} by {b} is {}.", a * b),
            "divide" if b == 0.0 => {
                format!("Error: division by zero is undefined; {a} cannot be divided by 0.")
            }
            "divide" => format!("The result of dividing {a} by {b} is {}.", a / b),
            other => format!("Error: unsupported operation `{other}`."),
        }
    }
}
