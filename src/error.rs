use thiserror::Error;

use crate::transcript::Transcript;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),

    #[error("invalid arguments for `{tool}`: `{field}` {constraint}")]
    Validation {
        tool: String,
        field: String,
        constraint: String,
    },

    #[error("inference endpoint unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("reached the limit of {limit} model turns without a final answer")]
    TurnLimitExceeded { limit: usize, transcript: Transcript },
}
