//! Error types for the editor

use cowrite_parser::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation error: {0}")]
    Operation(#[from] crate::operations::OpError),

    #[error("Document is not file-backed")]
    NotFileBacked,

    /// The document changed between sending the request and receiving the
    /// response. Nothing was applied.
    #[error("Document changed during the agent round (base {expected}, now {actual})")]
    Conflict { expected: String, actual: String },

    #[error("Agent request failed: {0}")]
    Transport(String),

    #[error("No operations applied: {}", .errors.join("; "))]
    BatchFailed { errors: Vec<String> },

    #[error("An agent round is already in flight")]
    Busy,

    #[error("Document is locked while the agent is editing")]
    Locked,

    #[error("No agent round in flight")]
    NoRoundInFlight,

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),
}

impl EditorError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Errors that end an agent round without touching the document
    pub fn is_round_fatal(&self) -> bool {
        matches!(
            self,
            EditorError::Conflict { .. } | EditorError::Transport(_) | EditorError::BatchFailed { .. }
        )
    }
}
