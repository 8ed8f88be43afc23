//! Error types for the agent boundary

use cowrite_editor::EditorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Agent edit returned no ops")]
    NoOps,

    #[error("Agent edit returned no markdown")]
    NoMarkdown,

    /// First problem found while validating returned ops
    #[error("{0}")]
    InvalidOps(String),

    #[error("Agent edit failed")]
    EditFailed,

    #[error("Agent chat failed")]
    ChatFailed,

    /// The model runner itself failed
    #[error("Model error: {0}")]
    Model(String),
}

impl AgentError {
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }
}

impl From<AgentError> for EditorError {
    fn from(error: AgentError) -> Self {
        EditorError::transport(error.to_string())
    }
}
