//! # Operations
//!
//! Structural edits proposed by an agent. Sections are addressed by heading
//! text (and optionally level) instead of raw positions; each operation
//! resolves its target against a freshly built [`HeadingIndex`] and turns it
//! into a single range mutation on the tree.
//!
//! ## Semantics
//!
//! - `append_markdown`: parsed content goes to the document end.
//! - `rename_heading`: only the heading's inline text changes.
//! - `delete_section`: removes the heading and its body.
//! - `replace_section_by_heading`: replaces the body, keeping the heading. A
//!   leading heading in the content that repeats the target is dropped.
//! - `insert_after_heading`: inserts right after the heading, same stripping.
//!   Content that opens with a list continues a list of the same kind that
//!   opens the body, so new items follow the existing ones.
//!
//! Heading text is a single line: line breaks in `newHeading` collapse to
//! spaces.

use crate::heading_index::HeadingIndex;
use cowrite_parser::ast::{plain_text, Block, TextRun};
use cowrite_parser::{parse_blocks, Document as Tree, NodeRef, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AppendMarkdown {
        #[serde(default)]
        markdown: String,
    },

    RenameHeading {
        #[serde(default)]
        heading: String,
        #[serde(default, rename = "newHeading")]
        new_heading: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u8>,
    },

    DeleteSection {
        #[serde(default)]
        heading: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u8>,
    },

    ReplaceSectionByHeading {
        #[serde(default)]
        heading: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u8>,
        #[serde(default)]
        markdown: String,
    },

    InsertAfterHeading {
        #[serde(default)]
        heading: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u8>,
        #[serde(default)]
        markdown: String,
    },
}

pub const OPERATION_NAMES: [&str; 5] = [
    "append_markdown",
    "rename_heading",
    "delete_section",
    "replace_section_by_heading",
    "insert_after_heading",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    #[error("Missing markdown in op")]
    MissingMarkdown,

    #[error("Missing heading in op")]
    MissingHeading,

    #[error("Missing new heading in op")]
    MissingNewHeading,

    #[error("Heading not found: {0}")]
    HeadingNotFound(String),

    #[error("Unknown op: {0}")]
    UnknownOp(String),

    #[error("Invalid op payload")]
    InvalidPayload,

    #[error("Invalid op payload: {0}")]
    Malformed(String),

    #[error("{0}")]
    Rejected(#[from] SchemaError),
}

/// Coarse classification of operation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpErrorKind {
    /// The operation itself is incomplete or unreadable
    Validation,
    /// The heading address did not resolve
    NotFound,
    /// The tree refused the mutation
    Rejected,
}

impl OpError {
    pub fn kind(&self) -> OpErrorKind {
        match self {
            OpError::HeadingNotFound(_) => OpErrorKind::NotFound,
            OpError::Rejected(_) => OpErrorKind::Rejected,
            _ => OpErrorKind::Validation,
        }
    }
}

pub type OpResult<T> = Result<T, OpError>;

/// Decode one raw operation. Unknown tags and malformed elements become
/// errors for that element only.
pub fn decode_operation(value: &Value) -> OpResult<Operation> {
    let object = value.as_object().ok_or(OpError::InvalidPayload)?;
    let tag = object
        .get("op")
        .and_then(Value::as_str)
        .ok_or(OpError::InvalidPayload)?;
    if !OPERATION_NAMES.contains(&tag) {
        return Err(OpError::UnknownOp(tag.to_string()));
    }
    serde_json::from_value(value.clone()).map_err(|e| OpError::Malformed(e.to_string()))
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AppendMarkdown { .. } => "append_markdown",
            Operation::RenameHeading { .. } => "rename_heading",
            Operation::DeleteSection { .. } => "delete_section",
            Operation::ReplaceSectionByHeading { .. } => "replace_section_by_heading",
            Operation::InsertAfterHeading { .. } => "insert_after_heading",
        }
    }

    /// Heading address, for operations that have one
    pub fn target(&self) -> Option<(&str, Option<u8>)> {
        match self {
            Operation::AppendMarkdown { .. } => None,
            Operation::RenameHeading { heading, level, .. }
            | Operation::DeleteSection { heading, level }
            | Operation::ReplaceSectionByHeading { heading, level, .. }
            | Operation::InsertAfterHeading { heading, level, .. } => Some((heading.trim(), *level)),
        }
    }

    /// Check required fields
    pub fn validate(&self) -> OpResult<()> {
        match self {
            Operation::AppendMarkdown { markdown } => {
                if blank(markdown) {
                    return Err(OpError::MissingMarkdown);
                }
            }
            Operation::RenameHeading {
                heading,
                new_heading,
                ..
            } => {
                if blank(heading) {
                    return Err(OpError::MissingHeading);
                }
                if blank(new_heading) {
                    return Err(OpError::MissingNewHeading);
                }
            }
            Operation::DeleteSection { heading, .. } => {
                if blank(heading) {
                    return Err(OpError::MissingHeading);
                }
            }
            Operation::ReplaceSectionByHeading {
                heading, markdown, ..
            }
            | Operation::InsertAfterHeading {
                heading, markdown, ..
            } => {
                if blank(markdown) {
                    return Err(OpError::MissingMarkdown);
                }
                if blank(heading) {
                    return Err(OpError::MissingHeading);
                }
            }
        }
        Ok(())
    }

    /// Apply to a tree. On error the tree is unchanged.
    pub fn apply(&self, tree: &mut Tree) -> OpResult<()> {
        self.validate()?;

        match self {
            Operation::AppendMarkdown { markdown } => {
                let end = tree.content_size();
                tree.replace_range(end, end, parse_blocks(markdown))?;
            }

            Operation::RenameHeading {
                heading,
                new_heading,
                level,
            } => {
                let index = HeadingIndex::build(tree);
                let entry = index
                    .find(heading, *level)
                    .ok_or_else(|| OpError::HeadingNotFound(heading.trim().to_string()))?;
                let new_text = single_line(new_heading);
                if entry.text != new_text {
                    tree.replace_inline(entry.position, vec![TextRun::plain(new_text)])?;
                }
            }

            Operation::DeleteSection { heading, level } => {
                let index = HeadingIndex::build(tree);
                let entry = index
                    .find(heading, *level)
                    .ok_or_else(|| OpError::HeadingNotFound(heading.trim().to_string()))?;
                let section = index.section_range(entry);
                tree.replace_range(section.start, section.end, Vec::new())?;
            }

            Operation::ReplaceSectionByHeading {
                heading,
                level,
                markdown,
            } => {
                let index = HeadingIndex::build(tree);
                let entry = index
                    .find(heading, *level)
                    .ok_or_else(|| OpError::HeadingNotFound(heading.trim().to_string()))?;
                let body = index.body_range(entry);
                let blocks = strip_duplicate_heading(parse_blocks(markdown), &entry.text);
                tree.replace_range(body.start, body.end, blocks)?;
            }

            Operation::InsertAfterHeading {
                heading,
                level,
                markdown,
            } => {
                let index = HeadingIndex::build(tree);
                let entry = index
                    .find(heading, *level)
                    .ok_or_else(|| OpError::HeadingNotFound(heading.trim().to_string()))?;
                let blocks = strip_duplicate_heading(parse_blocks(markdown), &entry.text);
                if let Some(first) = blocks.first() {
                    let at = insertion_point(tree, entry.end(), first);
                    tree.replace_range(at, at, blocks)?;
                }
            }
        }

        Ok(())
    }
}

fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Where inserted content goes: right after the heading, or after the list
/// that opens the body when the content continues it
fn insertion_point(tree: &Tree, after_heading: usize, first: &Block) -> usize {
    match tree.node_at(after_heading) {
        Some(NodeRef::Block(existing)) if existing.same_list_kind(first) => after_heading + existing.node_size(),
        _ => after_heading,
    }
}

/// Drop a leading heading that repeats the target heading's text
fn strip_duplicate_heading(mut blocks: Vec<Block>, target: &str) -> Vec<Block> {
    let duplicate = matches!(
        blocks.first(),
        Some(Block::Heading { content, .. }) if plain_text(content).trim() == target
    );
    if duplicate {
        blocks.remove(0);
    }
    blocks
}
