//! # Cowrite Agent
//!
//! The agent collaborator side of an edit round.
//!
//! A model is asked to call a single tool that reports its edit (ops for
//! mode A, whole markdown for mode B) plus a summary, an acknowledgement and
//! a chat reply. This crate builds the prompts, normalizes the loosely typed
//! tool output, validates the ops, and exposes the result to the editor
//! through [`cowrite_editor::AgentClient`].
//!
//! ```rust,ignore
//! use cowrite_agent::ScriptedAgent;
//!
//! let agent = ScriptedAgent::scripted(vec![recorded_payload]);
//! let outcome = session.run_round(&agent, "Add a tips section").await?;
//! ```

mod errors;
pub mod history;
pub mod normalize;
pub mod prompt;
pub mod scripted;
pub mod service;
pub mod wire;

pub use errors::AgentError;
pub use history::{ChatHistory, ChatItem};
pub use normalize::{extract_tool_payload, normalize_payload, validate_ops, NormalizedPayload};
pub use prompt::{build_prompt, PromptInput, PromptKind, DEFAULT_INSTRUCTION};
pub use scripted::{ScriptedAgent, ScriptedModel};
pub use service::{AgentService, ModelRunner};
pub use wire::{ChatRequest, ChatResponse, EditRequest, EditResponse};
