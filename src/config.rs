use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Remote model settings. `supports_tools` must be declared explicitly
/// false for models without native structured tool output; the agent
/// refuses to start against such a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_supports_tools")]
    pub supports_tools: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            supports_tools: default_supports_tools(),
        }
    }
}

fn default_provider() -> String {
    "openai-compat".to_string()
}

fn default_model() -> String {
    "qwen2.5-7b-instruct".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_supports_tools() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_max_turns() -> usize {
    6
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Use the available tools when they apply.".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl AppConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|err| {
            AgentError::Configuration(format!(
                "cannot read config file `{}`: {err}",
                path.as_ref().display()
            ))
        })?;
        let mut config: AppConfig = toml::from_str(&raw)
            .map_err(|err| AgentError::Configuration(format!("invalid config file: {err}")))?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(base_url) = env::var("TOOLBRIDGE_BASE_URL") {
            self.model.base_url = base_url;
        }
        if let Ok(model) = env::var("TOOLBRIDGE_MODEL") {
            self.model.model = model;
        }
        if let Ok(api_key) = env::var("TOOLBRIDGE_API_KEY") {
            self.model.api_key = Some(api_key);
        }
    }
}
