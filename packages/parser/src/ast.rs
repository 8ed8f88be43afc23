use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};

/// Formatting mark carried by an inline text run.
///
/// Declaration order is the canonical nesting order used by the
/// serializer: links wrap everything, code spans are innermost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link { href: String },
    Bold,
    Italic,
    Strike,
    Code,
}

impl Mark {
    fn rank(&self) -> u8 {
        match self {
            Mark::Link { .. } => 0,
            Mark::Bold => 1,
            Mark::Italic => 2,
            Mark::Strike => 3,
            Mark::Code => 4,
        }
    }

    /// Add a mark to a set, keeping canonical order and no duplicates.
    pub fn add_to(&self, marks: &[Mark]) -> Vec<Mark> {
        let mut next: Vec<Mark> = marks
            .iter()
            .filter(|m| m.rank() != self.rank())
            .cloned()
            .collect();
        next.push(self.clone());
        next.sort_by_key(Mark::rank);
        next
    }
}

/// A run of text sharing one set of marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        let mut marks = marks;
        marks.sort_by_key(Mark::rank);
        marks.dedup();
        Self {
            text: text.into(),
            marks,
        }
    }

    /// One position per Unicode scalar value
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }

    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.contains(mark)
    }
}

/// Node kinds of the document schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    Table,
    TableRow,
    TableCell,
    Text,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::BulletList => "bullet_list",
            NodeKind::OrderedList => "ordered_list",
            NodeKind::ListItem => "list_item",
            NodeKind::CodeBlock => "code_block",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table_row",
            NodeKind::TableCell => "table_cell",
            NodeKind::Text => "text",
        }
    }
}

/// Block-level node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<TextRun>,
    },
    Heading {
        level: u8,
        content: Vec<TextRun>,
    },
    BulletList {
        items: Vec<ListItem>,
    },
    OrderedList {
        start: u32,
        items: Vec<ListItem>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        text: String,
    },
    Table {
        rows: Vec<TableRow>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub header: bool,
    pub content: Vec<TextRun>,
}

/// Root document node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Borrowed view of any node, as returned by position lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Block(&'a Block),
    ListItem(&'a ListItem),
    TableRow(&'a TableRow),
    TableCell(&'a TableCell),
    Text(&'a TextRun),
}

impl NodeRef<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Block(block) => block.kind(),
            NodeRef::ListItem(_) => NodeKind::ListItem,
            NodeRef::TableRow(_) => NodeKind::TableRow,
            NodeRef::TableCell(_) => NodeKind::TableCell,
            NodeRef::Text(_) => NodeKind::Text,
        }
    }

    pub fn node_size(&self) -> usize {
        match self {
            NodeRef::Block(block) => block.node_size(),
            NodeRef::ListItem(item) => item.node_size(),
            NodeRef::TableRow(row) => row.node_size(),
            NodeRef::TableCell(cell) => cell.node_size(),
            NodeRef::Text(run) => run.size(),
        }
    }
}

pub fn inline_size(content: &[TextRun]) -> usize {
    content.iter().map(TextRun::size).sum()
}

/// Concatenated text of an inline sequence, marks ignored
pub fn plain_text(content: &[TextRun]) -> String {
    content.iter().map(|run| run.text.as_str()).collect()
}

fn validate_inline(content: &[TextRun]) -> SchemaResult<()> {
    if content.iter().any(|run| run.text.is_empty()) {
        return Err(SchemaError::EmptyText);
    }
    Ok(())
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            content: non_empty_run(text.into()),
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            content: non_empty_run(text.into()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Block::Paragraph { .. } => NodeKind::Paragraph,
            Block::Heading { .. } => NodeKind::Heading,
            Block::BulletList { .. } => NodeKind::BulletList,
            Block::OrderedList { .. } => NodeKind::OrderedList,
            Block::CodeBlock { .. } => NodeKind::CodeBlock,
            Block::Table { .. } => NodeKind::Table,
        }
    }

    /// Size in the linear addressing space: content plus open and close tokens
    pub fn node_size(&self) -> usize {
        let content = match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => inline_size(content),
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                items.iter().map(ListItem::node_size).sum()
            }
            Block::CodeBlock { text, .. } => text.chars().count(),
            Block::Table { rows } => rows.iter().map(TableRow::node_size).sum(),
        };
        content + 2
    }

    /// Inline content of textblocks (paragraphs and headings)
    pub fn inline_content(&self) -> Option<&[TextRun]> {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => Some(content.as_slice()),
            _ => None,
        }
    }

    /// Both blocks are lists of the same kind. Markdown cannot keep such
    /// lists apart when they are adjacent.
    pub fn same_list_kind(&self, other: &Block) -> bool {
        matches!(
            (self, other),
            (Block::BulletList { .. }, Block::BulletList { .. })
                | (Block::OrderedList { .. }, Block::OrderedList { .. })
        )
    }

    pub fn validate(&self) -> SchemaResult<()> {
        match self {
            Block::Paragraph { content } => validate_inline(content),
            Block::Heading { level, content } => {
                if !(1..=6).contains(level) {
                    return Err(SchemaError::InvalidHeadingLevel(*level));
                }
                validate_inline(content)
            }
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                if items.is_empty() {
                    return Err(SchemaError::EmptyContainer(self.kind().name()));
                }
                items.iter().try_for_each(ListItem::validate)
            }
            Block::CodeBlock { .. } => Ok(()),
            Block::Table { rows } => {
                if rows.is_empty() {
                    return Err(SchemaError::EmptyContainer(NodeKind::Table.name()));
                }
                rows.iter().try_for_each(TableRow::validate)
            }
        }
    }

    fn find_inside(&self, start: usize, pos: usize) -> Option<NodeRef<'_>> {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                find_child(content, start, pos, TextRun::size).map(|(run, _, _)| NodeRef::Text(run))
            }
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                let (item, item_start, exact) = find_child(items, start, pos, ListItem::node_size)?;
                if exact {
                    return Some(NodeRef::ListItem(item));
                }
                find_in_blocks(&item.children, item_start + 1, pos)
            }
            Block::CodeBlock { .. } => None,
            Block::Table { rows } => {
                let (row, row_start, exact) = find_child(rows, start, pos, TableRow::node_size)?;
                if exact {
                    return Some(NodeRef::TableRow(row));
                }
                let (cell, cell_start, exact) =
                    find_child(&row.cells, row_start + 1, pos, TableCell::node_size)?;
                if exact {
                    return Some(NodeRef::TableCell(cell));
                }
                find_child(&cell.content, cell_start + 1, pos, TextRun::size)
                    .map(|(run, _, _)| NodeRef::Text(run))
            }
        }
    }
}

fn non_empty_run(text: String) -> Vec<TextRun> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![TextRun::plain(text)]
    }
}

impl ListItem {
    pub fn new(children: Vec<Block>) -> Self {
        Self { children }
    }

    pub fn node_size(&self) -> usize {
        self.children.iter().map(Block::node_size).sum::<usize>() + 2
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if self.children.is_empty() {
            return Err(SchemaError::EmptyContainer(NodeKind::ListItem.name()));
        }
        self.children.iter().try_for_each(Block::validate)
    }
}

impl TableRow {
    pub fn node_size(&self) -> usize {
        self.cells.iter().map(TableCell::node_size).sum::<usize>() + 2
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if self.cells.is_empty() {
            return Err(SchemaError::EmptyContainer(NodeKind::TableRow.name()));
        }
        self.cells.iter().try_for_each(|cell| validate_inline(&cell.content))
    }
}

impl TableCell {
    pub fn node_size(&self) -> usize {
        inline_size(&self.content) + 2
    }
}

/// Locate the child covering `pos` in a sequence laid out from `start`.
/// Returns the child, its start position, and whether `pos` is exactly
/// at that start.
fn find_child<'a, T>(
    children: &'a [T],
    start: usize,
    pos: usize,
    size: impl Fn(&T) -> usize,
) -> Option<(&'a T, usize, bool)> {
    let mut offset = start;
    for child in children {
        let end = offset + size(child);
        if pos == offset {
            return Some((child, offset, true));
        }
        if pos < end {
            return Some((child, offset, false));
        }
        offset = end;
    }
    None
}

fn find_in_blocks(blocks: &[Block], start: usize, pos: usize) -> Option<NodeRef<'_>> {
    let (block, block_start, exact) = find_child(blocks, start, pos, Block::node_size)?;
    if exact {
        return Some(NodeRef::Block(block));
    }
    block.find_inside(block_start + 1, pos)
}

/// Path from the root to a block container: each step is
/// (index of list block, index of item within it).
type ContainerPath = Vec<(usize, usize)>;

/// Resolve `pos` to an index between blocks of some block container.
fn resolve_boundary(
    blocks: &[Block],
    start: usize,
    pos: usize,
    path: &mut ContainerPath,
) -> Option<usize> {
    let mut offset = start;
    for (index, block) in blocks.iter().enumerate() {
        if pos == offset {
            return Some(index);
        }
        let end = offset + block.node_size();
        if pos < end {
            let items = match block {
                Block::BulletList { items } | Block::OrderedList { items, .. } => items,
                _ => return None,
            };
            let mut item_start = offset + 1;
            for (item_index, item) in items.iter().enumerate() {
                let item_end = item_start + item.node_size();
                if pos > item_start && pos < item_end {
                    path.push((index, item_index));
                    return resolve_boundary(&item.children, item_start + 1, pos, path);
                }
                item_start = item_end;
            }
            return None;
        }
        offset = end;
    }
    (pos == offset).then_some(blocks.len())
}

fn container_mut<'a>(blocks: &'a mut Vec<Block>, path: &[(usize, usize)]) -> Option<&'a mut Vec<Block>> {
    let Some((&(block_index, item_index), rest)) = path.split_first() else {
        return Some(blocks);
    };
    match blocks.get_mut(block_index)? {
        Block::BulletList { items } | Block::OrderedList { items, .. } => {
            container_mut(&mut items.get_mut(item_index)?.children, rest)
        }
        _ => None,
    }
}

/// Fold each list into a preceding list of the same kind, the way the
/// parser reads them back. The first list keeps its start number.
fn merge_adjacent_lists(blocks: &mut Vec<Block>) {
    let mut index = 1;
    while index < blocks.len() {
        if !blocks[index - 1].same_list_kind(&blocks[index]) {
            index += 1;
            continue;
        }
        let next = blocks.remove(index);
        if let (
            Block::BulletList { items } | Block::OrderedList { items, .. },
            Block::BulletList { items: more } | Block::OrderedList { items: more, .. },
        ) = (&mut blocks[index - 1], next)
        {
            items.extend(more);
        }
    }
}

fn textblock_in_blocks(blocks: &mut [Block], start: usize, pos: usize) -> Option<&mut Vec<TextRun>> {
    let mut offset = start;
    for block in blocks.iter_mut() {
        let size = block.node_size();
        if pos == offset {
            return match block {
                Block::Paragraph { content } | Block::Heading { content, .. } => Some(content),
                _ => None,
            };
        }
        if pos < offset + size {
            return match block {
                Block::BulletList { items } | Block::OrderedList { items, .. } => {
                    let mut item_start = offset + 1;
                    for item in items.iter_mut() {
                        let item_size = item.node_size();
                        if pos > item_start && pos < item_start + item_size {
                            return textblock_in_blocks(&mut item.children, item_start + 1, pos);
                        }
                        item_start += item_size;
                    }
                    None
                }
                Block::Table { rows } => {
                    let mut row_start = offset + 1;
                    for row in rows.iter_mut() {
                        let row_size = row.node_size();
                        if pos > row_start && pos < row_start + row_size {
                            let mut cell_start = row_start + 1;
                            for cell in row.cells.iter_mut() {
                                if pos == cell_start {
                                    return Some(&mut cell.content);
                                }
                                cell_start += cell.node_size();
                            }
                            return None;
                        }
                        row_start += row_size;
                    }
                    None
                }
                _ => None,
            };
        }
        offset += size;
    }
    None
}

fn visit_block<F: FnMut(&Block, usize, usize)>(block: &Block, pos: usize, depth: usize, f: &mut F) -> usize {
    f(block, pos, depth);
    match block {
        Block::BulletList { items } | Block::OrderedList { items, .. } => {
            let mut item_pos = pos + 1;
            for item in items {
                let mut child_pos = item_pos + 1;
                for child in &item.children {
                    child_pos += visit_block(child, child_pos, depth + 1, f);
                }
                item_pos = child_pos + 1;
            }
            item_pos + 1 - pos
        }
        other => other.node_size(),
    }
}

impl Document {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Position of the document end (size of the root's content)
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn validate(&self) -> SchemaResult<()> {
        self.blocks.iter().try_for_each(Block::validate)
    }

    /// Visit every block depth-first in document order, passing its start
    /// position and nesting depth (0 for top-level blocks). Linear in the
    /// size of the tree.
    pub fn visit_blocks(&self, mut f: impl FnMut(&Block, usize, usize)) {
        let mut pos = 0;
        for block in &self.blocks {
            pos += visit_block(block, pos, 0, &mut f);
        }
    }

    /// The outermost node starting at `pos`, or the text run covering it.
    pub fn node_at(&self, pos: usize) -> Option<NodeRef<'_>> {
        find_in_blocks(&self.blocks, 0, pos)
    }

    /// Replace the blocks between two block boundaries of the same container.
    ///
    /// `from == to` inserts. Rejected when either endpoint falls inside a
    /// textblock, table or between list items, when the endpoints belong to
    /// different containers, or when the result would violate the schema.
    /// Lists of the same kind that end up adjacent are merged into one.
    pub fn replace_range(&mut self, from: usize, to: usize, blocks: Vec<Block>) -> SchemaResult<()> {
        if from > to {
            return Err(SchemaError::invalid_range(from, to));
        }
        let size = self.content_size();
        if to > size {
            return Err(SchemaError::out_of_bounds(to, size));
        }
        blocks.iter().try_for_each(Block::validate)?;

        let mut from_path = ContainerPath::new();
        let start = resolve_boundary(&self.blocks, 0, from, &mut from_path)
            .ok_or(SchemaError::NotBlockBoundary(from))?;
        let mut to_path = ContainerPath::new();
        let end = resolve_boundary(&self.blocks, 0, to, &mut to_path)
            .ok_or(SchemaError::NotBlockBoundary(to))?;
        if from_path != to_path {
            return Err(SchemaError::crosses_containers(from, to));
        }

        let nested = !from_path.is_empty();
        let container = container_mut(&mut self.blocks, &from_path)
            .ok_or(SchemaError::NotBlockBoundary(from))?;
        if nested && container.len() - (end - start) + blocks.len() == 0 {
            return Err(SchemaError::EmptyContainer(NodeKind::ListItem.name()));
        }
        container.splice(start..end, blocks);
        merge_adjacent_lists(container);
        Ok(())
    }

    /// Replace the inline content of the textblock starting at `pos`.
    /// Empty runs are dropped.
    pub fn replace_inline(&mut self, pos: usize, content: Vec<TextRun>) -> SchemaResult<()> {
        let size = self.content_size();
        if pos >= size {
            return Err(SchemaError::out_of_bounds(pos, size));
        }
        let target = textblock_in_blocks(&mut self.blocks, 0, pos)
            .ok_or(SchemaError::NotATextblock(pos))?;
        *target = content.into_iter().filter(|run| !run.text.is_empty()).collect();
        Ok(())
    }
}
