use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Violations of the document schema, raised by validation and by the
/// range primitives when a mutation would leave the tree malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Heading level must be between 1 and 6, found {0}")]
    InvalidHeadingLevel(u8),

    #[error("{0} must not be empty")]
    EmptyContainer(&'static str),

    #[error("Text runs must not be empty")]
    EmptyText,

    #[error("Position {pos} is outside the document (content size {size})")]
    OutOfBounds { pos: usize, size: usize },

    #[error("Invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("Position {0} is not a block boundary")]
    NotBlockBoundary(usize),

    #[error("Range {from}..{to} crosses block containers")]
    CrossesContainers { from: usize, to: usize },

    #[error("No textblock starts at position {0}")]
    NotATextblock(usize),
}

impl SchemaError {
    pub fn out_of_bounds(pos: usize, size: usize) -> Self {
        Self::OutOfBounds { pos, size }
    }

    pub fn invalid_range(from: usize, to: usize) -> Self {
        Self::InvalidRange { from, to }
    }

    pub fn crosses_containers(from: usize, to: usize) -> Self {
        Self::CrossesContainers { from, to }
    }
}
