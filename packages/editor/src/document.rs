//! # Document Handle
//!
//! The editing surface for one markdown document.
//!
//! A Document owns the live tree and exposes the primitives the rest of the
//! editor needs: a snapshot, a mutate-range primitive, position lookup and
//! serialization back to markdown. Documents can be:
//! - **Memory-backed**: temporary, for tests and scratch edits
//! - **File-backed**: loaded from disk and saved back
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Edit → Serialize → Save
//!   ↓      ↓       ↓         ↓        ↓
//! File   Tree  Operations  Markdown  File
//! ```

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::heading_index::HeadingIndex;
use crate::operations::{OpResult, Operation};
use crate::EditorError;
use cowrite_parser::{parse, serialize, Block, Document as Tree, NodeRef, TextRun};
use std::path::{Path, PathBuf};

/// Editable markdown document
#[derive(Debug, Clone)]
pub struct Document {
    /// Path to source file (if any)
    pub path: PathBuf,

    /// Current version number (increments on each mutation)
    pub version: u64,

    storage: DocumentStorage,
}

/// Storage backend for document
#[derive(Debug, Clone)]
pub enum DocumentStorage {
    /// In-memory only
    Memory { tree: Tree },

    /// File-backed
    File { tree: Tree, dirty: bool },
}

impl Document {
    /// Create document from markdown (memory-backed)
    pub fn from_markdown(path: impl Into<PathBuf>, source: &str) -> Self {
        Self::from_tree(path, parse(source))
    }

    /// Wrap an existing tree (memory-backed)
    pub fn from_tree(path: impl Into<PathBuf>, tree: Tree) -> Self {
        Self {
            path: path.into(),
            version: 0,
            storage: DocumentStorage::Memory { tree },
        }
    }

    /// Load document from file (file-backed)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&path)?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "loaded document");

        Ok(Self {
            path,
            version: 0,
            storage: DocumentStorage::File {
                tree: parse(&source),
                dirty: false,
            },
        })
    }

    pub fn tree(&self) -> &Tree {
        match &self.storage {
            DocumentStorage::Memory { tree } | DocumentStorage::File { tree, .. } => tree,
        }
    }

    /// Run a mutation against the tree, bumping the version and dirty flag
    /// only when it succeeds
    fn mutate<T, E>(&mut self, f: impl FnOnce(&mut Tree) -> Result<T, E>) -> Result<T, E> {
        let result = match &mut self.storage {
            DocumentStorage::Memory { tree } => f(tree)?,
            DocumentStorage::File { tree, dirty } => {
                let result = f(tree)?;
                *dirty = true;
                result
            }
        };
        self.version += 1;
        Ok(result)
    }

    /// Full copy of the current tree
    pub fn snapshot(&self) -> Tree {
        self.tree().clone()
    }

    pub fn to_markdown(&self) -> String {
        serialize(self.tree())
    }

    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(self.tree())
    }

    /// Fresh heading index for the current tree
    pub fn headings(&self) -> HeadingIndex {
        HeadingIndex::build(self.tree())
    }

    pub fn node_at(&self, pos: usize) -> Option<NodeRef<'_>> {
        self.tree().node_at(pos)
    }

    /// Replace the blocks between two block boundaries
    pub fn replace_range(&mut self, from: usize, to: usize, blocks: Vec<Block>) -> Result<(), EditorError> {
        self.mutate(|tree| tree.replace_range(from, to, blocks))?;
        Ok(())
    }

    /// Replace the inline content of the textblock starting at `pos`
    pub fn replace_inline(&mut self, pos: usize, content: Vec<TextRun>) -> Result<(), EditorError> {
        self.mutate(|tree| tree.replace_inline(pos, content))?;
        Ok(())
    }

    /// Apply an operation. The version only moves when it succeeds.
    pub fn apply(&mut self, operation: &Operation) -> OpResult<()> {
        self.mutate(|tree| operation.apply(tree))
    }

    /// Swap in a whole tree (rollback, full replacement)
    pub fn replace_tree(&mut self, tree: Tree) {
        match &mut self.storage {
            DocumentStorage::Memory { tree: current } => *current = tree,
            DocumentStorage::File { tree: current, dirty } => {
                *current = tree;
                *dirty = true;
            }
        }
        self.version += 1;
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(self.storage, DocumentStorage::File { .. })
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            DocumentStorage::Memory { .. } => false,
        }
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        let markdown = self.to_markdown();
        match &mut self.storage {
            DocumentStorage::File { dirty, .. } => {
                std::fs::write(&self.path, markdown)?;
                *dirty = false;
                tracing::debug!(path = %self.path.display(), "saved document");
                Ok(())
            }
            DocumentStorage::Memory { .. } => Err(EditorError::NotFileBacked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowrite_parser::NodeKind;

    #[test]
    fn test_create_memory_document() {
        let doc = Document::from_markdown("plan.md", "## Overview\n\nHello.\n");

        assert_eq!(doc.version, 0);
        assert!(!doc.is_dirty());
        assert!(!doc.is_file_backed());
        assert_eq!(doc.headings().texts(), vec!["Overview"]);
        assert_eq!(doc.node_at(0).map(|n| n.kind()), Some(NodeKind::Heading));
    }

    #[test]
    fn test_version_increments_only_on_success() {
        let mut doc = Document::from_markdown("plan.md", "## Overview\n");

        let missing = Operation::DeleteSection {
            heading: "Missing".to_string(),
            level: None,
        };
        assert!(doc.apply(&missing).is_err());
        assert_eq!(doc.version, 0);

        let append = Operation::AppendMarkdown {
            markdown: "More".to_string(),
        };
        doc.apply(&append).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.to_markdown(), "## Overview\n\nMore\n");
    }

    #[test]
    fn test_replace_range_rejection_surfaces_schema_error() {
        let mut doc = Document::from_markdown("plan.md", "## Overview\n");
        let err = doc.replace_range(1, 1, vec![]).unwrap_err();
        assert!(matches!(err, EditorError::Schema(_)));
    }

    #[test]
    fn test_memory_document_cannot_save() {
        let mut doc = Document::from_markdown("plan.md", "text");
        assert!(matches!(doc.save(), Err(EditorError::NotFileBacked)));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.md");
        std::fs::write(&path, "# Plan\n\nDraft\n").unwrap();

        let mut doc = Document::load(&path).unwrap();
        assert!(doc.is_file_backed());
        doc.apply(&Operation::RenameHeading {
            heading: "Plan".to_string(),
            new_heading: "Launch Plan".to_string(),
            level: Some(1),
        })
        .unwrap();
        assert!(doc.is_dirty());

        doc.save().unwrap();
        assert!(!doc.is_dirty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Launch Plan\n\nDraft\n");
    }
}
