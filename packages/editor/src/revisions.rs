//! # Revision Log
//!
//! Append-only history of document states for one editing mode.
//!
//! ## Design
//!
//! - Every entry stores a full tree snapshot, so rollback is exact
//! - Entries are kept newest first
//! - Rollback never removes entries; it is recorded as a new human revision
//! - An optional capacity drops the oldest entries (0 = unlimited)

use crate::id_generator::IdGenerator;
use chrono::{DateTime, Utc};
use cowrite_parser::Document as Tree;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Human,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionEntry {
    pub id: String,
    pub actor: Actor,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    pub snapshot: Tree,
}

#[derive(Debug, Clone)]
pub struct RevisionLog {
    /// Newest first
    entries: VecDeque<RevisionEntry>,

    ids: IdGenerator,

    /// Maximum number of entries kept (0 = unlimited)
    max_revisions: usize,
}

impl RevisionLog {
    /// Create a log whose ids derive from `scope` (session id plus mode)
    pub fn new(scope: &str) -> Self {
        Self::with_max_revisions(scope, 0)
    }

    pub fn with_max_revisions(scope: &str, max_revisions: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            ids: IdGenerator::new(scope),
            max_revisions,
        }
    }

    /// Record a snapshot and return its id
    pub fn record(&mut self, actor: Actor, summary: impl Into<String>, snapshot: Tree) -> String {
        let id = self.ids.new_id();
        let summary = summary.into();
        tracing::debug!(id = %id, ?actor, summary = %summary, "recorded revision");

        self.entries.push_front(RevisionEntry {
            id: id.clone(),
            actor,
            summary,
            timestamp: Utc::now(),
            snapshot,
        });

        if self.max_revisions > 0 {
            self.entries.truncate(self.max_revisions);
        }

        id
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &RevisionEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&RevisionEntry> {
        self.entries.front()
    }

    pub fn get(&self, id: &str) -> Option<&RevisionEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
