//! # Agent Service
//!
//! Edit and chat endpoints over a [`ModelRunner`]. The runner does the model
//! call; the service builds prompts, keeps chat history, and turns whatever
//! the model returned into a validated response.

use crate::errors::AgentError;
use crate::history::{ChatHistory, ChatItem, DEFAULT_SESSION_ID};
use crate::normalize::{extract_tool_payload, normalize_payload, resolve_edit, validate_ops, NormalizedPayload};
use crate::prompt::{build_prompt, PromptInput, PromptKind};
use crate::wire::{ChatRequest, ChatResponse, EditRequest, EditResponse};
use async_trait::async_trait;
use cowrite_editor::{AgentClient, AgentRequest, AgentResponse, EditMode, EditorError};
use serde_json::Value;
use tokio::sync::Mutex;

/// Runs one prompt against a model and returns the raw run result
#[async_trait]
pub trait ModelRunner: Send + Sync {
    async fn run(&self, prompt: &str, history: &[ChatItem]) -> Result<Value, AgentError>;
}

pub struct AgentService<R> {
    runner: R,
    history: Mutex<ChatHistory>,
}

impl<R: ModelRunner> AgentService<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            history: Mutex::new(ChatHistory::new()),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Chat history for a session, oldest first
    pub async fn history(&self, session_id: &str) -> Vec<ChatItem> {
        self.history.lock().await.items(session_id).to_vec()
    }

    async fn run_for_payload(&self, prompt: &str, history: &[ChatItem]) -> Result<Option<NormalizedPayload>, AgentError> {
        let result = self.runner.run(prompt, history).await?;
        Ok(extract_tool_payload(&result).map(|payload| normalize_payload(&payload)))
    }

    pub async fn edit(&self, request: EditRequest) -> Result<EditResponse, AgentError> {
        let mode = EditMode::from_label(&request.mode);
        let content = request.markdown.as_deref().unwrap_or("");
        tracing::debug!(mode = %mode, content_len = content.len(), "edit request");

        let prompt = build_prompt(
            PromptKind::Edit,
            mode,
            &PromptInput {
                content,
                base_hash: request.base_hash.as_deref(),
                schema_hints: request.schema_hints.as_deref(),
                recent_revision: request.recent_revision.as_deref().unwrap_or(""),
                instruction: request.instruction.as_deref().unwrap_or(""),
                message: "",
            },
        );

        let payload = self.run_for_payload(&prompt, &[]).await?.ok_or(AgentError::EditFailed)?;
        resolve_edit(mode, &payload)?;

        Ok(EditResponse {
            summary: payload.summary,
            ack: payload.ack,
            reply: Some(payload.reply).filter(|reply| !reply.is_empty()),
            ops: payload.ops.filter(|_| mode == EditMode::Operations),
            markdown: payload.markdown.filter(|_| mode == EditMode::FullReplace),
            base_hash: payload.base_hash.or(request.base_hash),
        })
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let mode = EditMode::from_label(request.mode.as_deref().unwrap_or("A"));
        let session_id = request
            .session_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
        let items = self.history(&session_id).await;

        let prompt = build_prompt(
            PromptKind::Chat,
            mode,
            &PromptInput {
                content: request.markdown.as_deref().unwrap_or(""),
                base_hash: request.base_hash.as_deref(),
                schema_hints: request.schema_hints.as_deref(),
                recent_revision: "",
                instruction: "",
                message: &request.message,
            },
        );

        let payload = self.run_for_payload(&prompt, &items).await?.ok_or(AgentError::ChatFailed)?;

        let history_reply = reply_or_default(&payload.reply, payload.has_edit());
        self.history
            .lock()
            .await
            .record_exchange(&session_id, &request.message, &history_reply);

        let ops = payload.ops.filter(|_| mode == EditMode::Operations);
        let markdown = payload.markdown.filter(|_| mode == EditMode::FullReplace);
        if let Some(ops) = &ops {
            validate_ops(ops)?;
        }

        Ok(ChatResponse {
            reply: reply_or_default(&payload.reply, ops.is_some() || markdown.is_some()),
            summary: Some(payload.summary).filter(|summary| !summary.is_empty()),
            markdown,
            session_id: Some(session_id),
            ops,
            base_hash: payload.base_hash.or(request.base_hash),
        })
    }
}

fn reply_or_default(reply: &str, edited: bool) -> String {
    if !reply.is_empty() {
        reply.to_string()
    } else if edited {
        "Applied the edit.".to_string()
    } else {
        "Okay.".to_string()
    }
}

#[async_trait]
impl<R: ModelRunner> AgentClient for AgentService<R> {
    async fn request_edit(&self, request: &AgentRequest) -> Result<AgentResponse, EditorError> {
        let response = self.edit(EditRequest::from(request)).await?;
        Ok(response.into_agent_response(request.mode))
    }
}
