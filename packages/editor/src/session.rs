//! # Edit Session
//!
//! Coordinates human input and agent rounds on one document.
//!
//! ## Round lifecycle
//!
//! ```text
//! Idle → AwaitingAgent → Reconciling → Applying → Idle
//!                             ↓
//!                    conflict: Idle, nothing applied
//! ```
//!
//! `begin_round` captures the base fingerprint and takes the lock on human
//! input. `complete_round` re-fingerprints the document: if it moved, the
//! response is discarded with [`EditorError::Conflict`]. Every exit path,
//! success or failure, returns the session to `Idle`.

use crate::agent::{AgentClient, AgentEdit, AgentRequest, AgentResponse};
use crate::config::{EditMode, SessionConfig};
use crate::engine::{ApplyReport, OperationEngine};
use crate::fingerprint::Fingerprint;
use crate::revisions::{Actor, RevisionLog};
use crate::{Document, EditorError};
use cowrite_parser::parse;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    AwaitingAgent { round: u64 },
    Reconciling { round: u64 },
    Applying { round: u64 },
}

impl SessionState {
    pub fn round(&self) -> Option<u64> {
        match self {
            SessionState::Idle => None,
            SessionState::AwaitingAgent { round }
            | SessionState::Reconciling { round }
            | SessionState::Applying { round } => Some(*round),
        }
    }
}

/// Result of a round that changed the document
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Applied {
        report: ApplyReport,
        revision_id: String,
        reply: String,
    },
    Replaced {
        revision_id: String,
        reply: String,
    },
}

impl RoundOutcome {
    pub fn revision_id(&self) -> &str {
        match self {
            RoundOutcome::Applied { revision_id, .. } | RoundOutcome::Replaced { revision_id, .. } => revision_id,
        }
    }

    pub fn reply(&self) -> &str {
        match self {
            RoundOutcome::Applied { reply, .. } | RoundOutcome::Replaced { reply, .. } => reply,
        }
    }
}

pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    document: Document,
    engine: OperationEngine,
    config: SessionConfig,
    state: SessionState,

    /// Fingerprint captured when the current round began
    base: Option<Fingerprint>,
    rounds: u64,

    operations_log: RevisionLog,
    replace_log: RevisionLog,

    /// Human edits not yet recorded as a revision
    dirty: bool,
}

impl EditSession {
    pub fn new(id: impl Into<String>, document: Document, config: SessionConfig) -> Self {
        let id = id.into();
        let mut operations_log =
            RevisionLog::with_max_revisions(&format!("{}:{}", id, EditMode::Operations), config.max_revisions);
        let mut replace_log =
            RevisionLog::with_max_revisions(&format!("{}:{}", id, EditMode::FullReplace), config.max_revisions);
        operations_log.record(Actor::Human, "Initial version", document.snapshot());
        replace_log.record(Actor::Human, "Initial version", document.snapshot());

        Self {
            id,
            document,
            engine: OperationEngine::with_max_warning_messages(config.max_warning_messages),
            config,
            state: SessionState::Idle,
            base: None,
            rounds: 0,
            operations_log,
            replace_log,
            dirty: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> EditMode {
        self.config.mode
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Human input is disabled while a round is in flight
    pub fn is_locked(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Revision log for the active mode
    pub fn revisions(&self) -> &RevisionLog {
        match self.config.mode {
            EditMode::Operations => &self.operations_log,
            EditMode::FullReplace => &self.replace_log,
        }
    }

    fn revisions_mut(&mut self) -> &mut RevisionLog {
        match self.config.mode {
            EditMode::Operations => &mut self.operations_log,
            EditMode::FullReplace => &mut self.replace_log,
        }
    }

    /// Operator-facing warning for a partially applied batch
    pub fn warning(&self, report: &ApplyReport) -> Option<String> {
        self.engine.warning(report)
    }

    pub fn set_mode(&mut self, mode: EditMode) -> Result<(), EditorError> {
        if self.is_locked() {
            return Err(EditorError::Busy);
        }
        self.config.mode = mode;
        Ok(())
    }

    /// Apply a human edit. Rejected while an agent round holds the lock.
    pub fn human_edit<T>(&mut self, edit: impl FnOnce(&mut Document) -> Result<T, EditorError>) -> Result<T, EditorError> {
        if self.is_locked() {
            return Err(EditorError::Locked);
        }
        let result = edit(&mut self.document)?;
        self.dirty = true;
        Ok(result)
    }

    /// Apply human input that was queued before the lock took effect. It
    /// lands while the round is in flight, so the round will reconcile
    /// against a moved document.
    #[cfg(any(test, feature = "test-util"))]
    pub fn apply_queued_input<T>(
        &mut self,
        edit: impl FnOnce(&mut Document) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let result = edit(&mut self.document)?;
        self.dirty = true;
        Ok(result)
    }

    /// Write unsaved changes of a file-backed document to disk, whoever made
    /// them, and record pending human edits as a revision. Returns the new
    /// revision id when human edits were recorded.
    pub fn autosave(&mut self, summary: &str) -> Result<Option<String>, EditorError> {
        if self.is_locked() {
            return Err(EditorError::Locked);
        }
        if self.document.is_dirty() {
            self.document.save()?;
        }
        if !self.dirty {
            return Ok(None);
        }
        let snapshot = self.document.snapshot();
        let id = self.revisions_mut().record(Actor::Human, summary, snapshot);
        self.dirty = false;
        Ok(Some(id))
    }

    /// Start a round: capture the base fingerprint and lock human input
    pub fn begin_round(&mut self, instruction: &str) -> Result<AgentRequest, EditorError> {
        if self.is_locked() {
            return Err(EditorError::Busy);
        }
        self.autosave("Human edits")?;

        self.rounds += 1;
        let round = self.rounds;
        let markdown = self.document.to_markdown();
        let base = Fingerprint::of_markdown(&markdown);
        tracing::info!(session = %self.id, round, base = %base, mode = %self.config.mode, "agent round started");

        self.base = Some(base.clone());
        self.state = SessionState::AwaitingAgent { round };

        Ok(AgentRequest {
            round,
            mode: self.config.mode,
            markdown,
            instruction: instruction.trim().to_string(),
            base_hash: base,
            recent_revision: self.revisions().latest().map(|entry| entry.summary.clone()),
        })
    }

    /// Reconcile and apply the agent's response
    pub fn complete_round(&mut self, response: AgentResponse) -> Result<RoundOutcome, EditorError> {
        let round = match self.state {
            SessionState::AwaitingAgent { round } => round,
            _ => return Err(EditorError::NoRoundInFlight),
        };
        let Some(base) = self.base.take() else {
            self.state = SessionState::Idle;
            return Err(EditorError::NoRoundInFlight);
        };

        self.state = SessionState::Reconciling { round };
        let result = self.reconcile(round, &base, response);
        self.state = SessionState::Idle;

        match &result {
            Ok(outcome) => {
                tracing::info!(session = %self.id, round, revision = outcome.revision_id(), "agent round applied")
            }
            Err(e) => tracing::warn!(session = %self.id, round, error = %e, "agent round failed"),
        }
        result
    }

    /// Abandon the round after a transport failure. Returns the error so the
    /// caller can surface it.
    pub fn fail_round(&mut self, error: EditorError) -> EditorError {
        if let Some(round) = self.state.round() {
            tracing::warn!(session = %self.id, round, error = %error, "agent request failed");
        }
        self.base = None;
        self.state = SessionState::Idle;
        error
    }

    /// Drive a whole round against a client, bounded by the agent timeout
    pub async fn run_round<C>(&mut self, client: &C, instruction: &str) -> Result<RoundOutcome, EditorError>
    where
        C: AgentClient + ?Sized,
    {
        let request = self.begin_round(instruction)?;
        let timeout = self.config.agent_timeout;

        match tokio::time::timeout(timeout, client.request_edit(&request)).await {
            Ok(Ok(response)) => self.complete_round(response),
            Ok(Err(e)) => Err(self.fail_round(e)),
            Err(_) => Err(self.fail_round(EditorError::transport(format!(
                "Agent did not respond within {}s",
                timeout.as_secs_f64()
            )))),
        }
    }

    fn reconcile(&mut self, round: u64, base: &Fingerprint, response: AgentResponse) -> Result<RoundOutcome, EditorError> {
        let current = self.document.fingerprint();
        if &current != base {
            return Err(EditorError::Conflict {
                expected: base.to_string(),
                actual: current.to_string(),
            });
        }
        if let Some(echoed) = response.base_hash.as_deref() {
            if !base.matches(echoed) {
                return Err(EditorError::Conflict {
                    expected: base.to_string(),
                    actual: echoed.trim().to_string(),
                });
            }
        }

        self.state = SessionState::Applying { round };
        let summary = if response.summary.trim().is_empty() {
            "Agent edit".to_string()
        } else {
            response.summary.trim().to_string()
        };

        match (self.config.mode, response.edit) {
            (EditMode::Operations, AgentEdit::Operations(ops)) if !ops.is_empty() => {
                let report = self.engine.apply_json_batch(&mut self.document, &ops);
                if report.is_failure() {
                    return Err(EditorError::BatchFailed { errors: report.errors });
                }
                if let Some(warning) = self.engine.warning(&report) {
                    tracing::warn!(session = %self.id, round, "{}", warning);
                }
                let snapshot = self.document.snapshot();
                let revision_id = self.revisions_mut().record(Actor::Agent, summary, snapshot);
                Ok(RoundOutcome::Applied {
                    report,
                    revision_id,
                    reply: response.reply,
                })
            }
            (EditMode::FullReplace, AgentEdit::Replacement(markdown)) if !markdown.trim().is_empty() => {
                self.document.replace_tree(parse(&markdown));
                let snapshot = self.document.snapshot();
                let revision_id = self.revisions_mut().record(Actor::Agent, summary, snapshot);
                Ok(RoundOutcome::Replaced {
                    revision_id,
                    reply: response.reply,
                })
            }
            (EditMode::Operations, _) => Err(EditorError::transport("Agent edit returned no ops")),
            (EditMode::FullReplace, _) => Err(EditorError::transport("Agent edit returned no markdown")),
        }
    }

    /// Replace the document with a stored snapshot from the active mode's
    /// log. The rollback itself is recorded as a new human revision.
    pub fn rollback(&mut self, revision_id: &str) -> Result<String, EditorError> {
        if self.is_locked() {
            return Err(EditorError::Locked);
        }
        let snapshot = self
            .revisions()
            .get(revision_id)
            .map(|entry| entry.snapshot.clone())
            .ok_or_else(|| EditorError::RevisionNotFound(revision_id.to_string()))?;

        self.document.replace_tree(snapshot.clone());
        self.dirty = false;
        let id = self
            .revisions_mut()
            .record(Actor::Human, format!("Rolled back to {}", revision_id), snapshot);
        tracing::debug!(session = %self.id, revision = revision_id, "rolled back");
        Ok(id)
    }
}
