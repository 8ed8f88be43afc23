//! # Cowrite Editor
//!
//! Collaborative editing core for structured markdown documents: a human and
//! an agent edit the same document without the agent silently overwriting
//! concurrent human work.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: markdown → tree, tree → markdown    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document + agent edit rounds        │
//! │  - Heading index over the live tree         │
//! │  - Operation engine (heading-addressed)     │
//! │  - Fingerprint conflict detection           │
//! │  - Revision log with snapshot rollback      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ agent: request/response boundary            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cowrite_editor::{Document, EditSession, SessionConfig};
//!
//! let doc = Document::load("plan.md")?;
//! let mut session = EditSession::new("s1", doc, SessionConfig::default());
//!
//! // One agent round: lock, request, reconcile, apply, unlock
//! let outcome = session.run_round(&client, "Rename Risks to Open Risks").await?;
//! ```

pub mod agent;
pub mod config;
mod document;
pub mod engine;
mod errors;
pub mod fingerprint;
pub mod heading_index;
pub mod id_generator;
pub mod operations;
pub mod revisions;
pub mod session;

pub use agent::{AgentClient, AgentEdit, AgentRequest, AgentResponse};
pub use config::{EditMode, SessionConfig};
pub use document::{Document, DocumentStorage};
pub use engine::{ApplyReport, OperationEngine};
pub use errors::EditorError;
pub use fingerprint::{fingerprint, Fingerprint};
pub use heading_index::{HeadingEntry, HeadingIndex};
pub use operations::{decode_operation, OpError, OpErrorKind, OpResult, Operation};
pub use revisions::{Actor, RevisionEntry, RevisionLog};
pub use session::{EditSession, RoundOutcome, SessionState};

// Re-export common types for convenience
pub use cowrite_parser::Document as Tree;
