//! Built-in tools.

mod calculator;
mod weather;

pub use calculator::CalculatorTool;
pub use weather::WeatherTool;

use crate::error::Result;
use crate::tool::ToolRegistry;

/// Registry holding the stock weather and calculator tools.
pub fn builtin_toolkit() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new())?;
    registry.register(CalculatorTool::new())?;
    Ok(registry)
}
