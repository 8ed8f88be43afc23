//! # Agent Boundary
//!
//! What an edit round sends to the agent collaborator and what comes back.
//! The transport lives behind [`AgentClient`]; the session only sees these
//! shapes.

use crate::config::EditMode;
use crate::fingerprint::Fingerprint;
use crate::EditorError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// One editing request, captured when a round begins
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub round: u64,
    pub mode: EditMode,
    /// Serialized document at the start of the round
    pub markdown: String,
    pub instruction: String,
    /// Fingerprint of `markdown`, expected back unchanged
    pub base_hash: Fingerprint,
    /// Summary of the most recent revision in this mode
    pub recent_revision: Option<String>,
}

/// The change an agent proposes
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEdit {
    /// Raw operations, decoded one by one by the engine
    Operations(Vec<Value>),
    /// Whole-document replacement
    Replacement(String),
    /// No edit (chat-only answer)
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub edit: AgentEdit,
    pub summary: String,
    pub reply: String,
    /// Base hash echoed by the agent, if it sent one
    pub base_hash: Option<String>,
}

impl AgentResponse {
    pub fn operations(ops: Vec<Value>, summary: impl Into<String>) -> Self {
        Self {
            edit: AgentEdit::Operations(ops),
            summary: summary.into(),
            reply: String::new(),
            base_hash: None,
        }
    }

    pub fn replacement(markdown: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            edit: AgentEdit::Replacement(markdown.into()),
            summary: summary.into(),
            reply: String::new(),
            base_hash: None,
        }
    }

    pub fn with_base_hash(mut self, base_hash: impl Into<String>) -> Self {
        self.base_hash = Some(base_hash.into());
        self
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }
}

/// Transport to the agent collaborator
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn request_edit(&self, request: &AgentRequest) -> Result<AgentResponse, EditorError>;
}
