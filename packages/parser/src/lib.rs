pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{Block, Document, ListItem, Mark, NodeKind, NodeRef, TableCell, TableRow, TextRun};
pub use error::{SchemaError, SchemaResult};
pub use parser::{parse, parse_blocks, parse_inline, Parser};
pub use serializer::{serialize, serialize_inline, Serializer};
pub use tokenizer::{tokenize_inline, InlineToken};
