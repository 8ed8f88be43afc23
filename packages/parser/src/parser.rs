use crate::ast::*;
use crate::tokenizer::{tokenize_inline, InlineToken};
use std::ops::Range;

/// Line-oriented markdown block parser.
///
/// Parsing never fails: anything that is not recognised as a block construct
/// becomes paragraph text, and unmatched inline delimiters stay literal.
pub struct Parser<'src> {
    lines: Vec<&'src str>,
    pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListMarker {
    ordered: bool,
    number: u32,
    content_offset: usize,
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    ch: char,
    len: usize,
    indent: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::from_lines(source.lines().collect())
    }

    fn from_lines(lines: Vec<&'src str>) -> Self {
        Self { lines, pos: 0 }
    }

    /// Parse a complete document
    pub fn parse_document(&mut self) -> Document {
        Document::from_blocks(self.parse_blocks())
    }

    fn parse_blocks(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();
        while let Some(line) = self.peek() {
            if is_blank(line) {
                self.advance();
                continue;
            }
            blocks.push(self.parse_block(line));
        }
        blocks
    }

    fn parse_block(&mut self, line: &'src str) -> Block {
        if let Some(fence) = fence_open(line) {
            return self.parse_code_block(line, fence);
        }
        if let Some((level, text)) = atx_heading(line) {
            self.advance();
            return Block::Heading {
                level,
                content: parse_inline(text),
            };
        }
        if self.table_starts_at(self.pos) {
            return self.parse_table();
        }
        if let Some(marker) = list_marker(line) {
            return self.parse_list(marker);
        }
        self.parse_paragraph()
    }

    fn parse_code_block(&mut self, open: &str, fence: Fence) -> Block {
        self.advance();
        let info = open.trim_start()[fence.len..].trim();
        let language = info
            .split_whitespace()
            .next()
            .map(|lang| lang.to_string());

        let mut text_lines = Vec::new();
        while let Some(line) = self.advance() {
            if is_fence_close(line, fence) {
                break;
            }
            text_lines.push(strip_indent(line, fence.indent));
        }

        Block::CodeBlock {
            language,
            text: text_lines.join("\n"),
        }
    }

    fn parse_table(&mut self) -> Block {
        let header = self.advance().map(split_row).unwrap_or_default();
        self.advance(); // delimiter row
        let columns = header.len();

        let mut rows = vec![TableRow {
            cells: header.iter().map(|cell| table_cell(cell, true)).collect(),
        }];

        while let Some(line) = self.peek() {
            if is_blank(line) || !line.contains('|') {
                break;
            }
            self.advance();
            let mut cells: Vec<TableCell> = split_row(line)
                .iter()
                .take(columns)
                .map(|cell| table_cell(cell, false))
                .collect();
            while cells.len() < columns {
                cells.push(table_cell("", false));
            }
            rows.push(TableRow { cells });
        }

        Block::Table { rows }
    }

    fn parse_list(&mut self, first: ListMarker) -> Block {
        let mut items = Vec::new();

        loop {
            let Some(line) = self.peek() else { break };
            let Some(marker) = list_marker(line) else { break };
            if marker.ordered != first.ordered {
                break;
            }
            self.advance();
            items.push(self.parse_list_item(line, marker));

            // Blank lines between siblings keep the list going
            let mut next = self.pos;
            while next < self.lines.len() && is_blank(self.lines[next]) {
                next += 1;
            }
            match self.lines.get(next).and_then(|line| list_marker(line)) {
                Some(marker) if marker.ordered == first.ordered && next > self.pos => {
                    self.pos = next;
                }
                _ => {}
            }
        }

        if first.ordered {
            Block::OrderedList {
                start: first.number.max(1),
                items,
            }
        } else {
            Block::BulletList { items }
        }
    }

    fn parse_list_item(&mut self, line: &'src str, marker: ListMarker) -> ListItem {
        let mut item_lines = vec![line.get(marker.content_offset..).unwrap_or("")];

        while let Some(next) = self.peek() {
            if is_blank(next) {
                let continues = self.lines[self.pos..]
                    .iter()
                    .find(|line| !is_blank(line))
                    .is_some_and(|line| indent_of(line) >= marker.content_offset);
                if !continues {
                    break;
                }
                item_lines.push("");
                self.advance();
                continue;
            }

            if indent_of(next) >= marker.content_offset {
                item_lines.push(strip_indent(next, marker.content_offset));
                self.advance();
                continue;
            }

            // Lazy paragraph continuation
            let after_text = item_lines.last().is_some_and(|line| !is_blank(line));
            if after_text && !self.block_starts_at(self.pos) {
                item_lines.push(next.trim());
                self.advance();
                continue;
            }
            break;
        }

        let mut children = Parser::from_lines(item_lines).parse_blocks();
        if children.is_empty() {
            children.push(Block::Paragraph {
                content: Vec::new(),
            });
        }
        ListItem::new(children)
    }

    fn parse_paragraph(&mut self) -> Block {
        let mut lines = Vec::new();
        while let Some(line) = self.peek() {
            if is_blank(line) || (!lines.is_empty() && self.block_starts_at(self.pos)) {
                break;
            }
            lines.push(line.trim());
            self.advance();
        }
        Block::Paragraph {
            content: parse_inline(&lines.join("\n")),
        }
    }

    fn block_starts_at(&self, index: usize) -> bool {
        let Some(line) = self.lines.get(index) else {
            return false;
        };
        fence_open(line).is_some()
            || atx_heading(line).is_some()
            || list_marker(line).is_some()
            || self.table_starts_at(index)
    }

    fn table_starts_at(&self, index: usize) -> bool {
        let (Some(header), Some(delimiter)) = (self.lines.get(index), self.lines.get(index + 1)) else {
            return false;
        };
        if !header.contains('|') || !delimiter.contains('|') {
            return false;
        }
        let columns = split_row(delimiter);
        !columns.is_empty()
            && columns.iter().all(|cell| is_delimiter_cell(cell))
            && split_row(header).len() == columns.len()
    }

    fn peek(&self) -> Option<&'src str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'src str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Indentation width in columns, tabs counting as four
fn indent_of(line: &str) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}

fn strip_indent(line: &str, columns: usize) -> &str {
    let mut width = 0;
    for (offset, ch) in line.char_indices() {
        if width >= columns {
            return &line[offset..];
        }
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => return &line[offset..],
        }
    }
    ""
}

fn fence_open(line: &str) -> Option<Fence> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let rest = line.trim_start();
    let ch = rest.chars().next().filter(|ch| *ch == '`' || *ch == '~')?;
    let len = rest.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    if ch == '`' && rest[len..].contains('`') {
        return None;
    }
    Some(Fence { ch, len, indent })
}

fn is_fence_close(line: &str, fence: Fence) -> bool {
    if indent_of(line) > 3 {
        return false;
    }
    let rest = line.trim();
    let len = rest.chars().take_while(|c| *c == fence.ch).count();
    len >= fence.len && len == rest.chars().count()
}

fn atx_heading(line: &str) -> Option<(u8, &str)> {
    if indent_of(line) > 3 {
        return None;
    }
    let rest = line.trim_start();
    let level = rest.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !(after.is_empty() || after.starts_with(' ') || after.starts_with('\t')) {
        return None;
    }

    let mut text = after.trim();
    // Optional closing sequence, only when separated by a space
    let without_hashes = text.trim_end_matches('#');
    if without_hashes.len() != text.len()
        && (without_hashes.is_empty() || without_hashes.ends_with(' ') || without_hashes.ends_with('\t'))
    {
        text = without_hashes.trim_end();
    }

    // level is at most 6 here
    Some((level as u8, text))
}

fn list_marker(line: &str) -> Option<ListMarker> {
    if indent_of(line) > 3 {
        return None;
    }
    let rest = line.trim_start();
    let leading = line.len() - rest.len();

    let (ordered, number, marker_len) = match rest.chars().next()? {
        '-' | '*' | '+' => (false, 0, 1),
        '0'..='9' => {
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits > 9 {
                return None;
            }
            match rest[digits..].chars().next() {
                Some('.') | Some(')') => {}
                _ => return None,
            }
            let number = rest[..digits].parse().ok()?;
            (true, number, digits + 1)
        }
        _ => return None,
    };

    let after = &rest[marker_len..];
    if after.is_empty() {
        return Some(ListMarker {
            ordered,
            number,
            content_offset: leading + marker_len + 1,
        });
    }
    let spaces = after.chars().take_while(|c| *c == ' ').count();
    if spaces == 0 {
        return None;
    }
    let padding = if spaces > 4 || spaces == after.len() { 1 } else { spaces };

    Some(ListMarker {
        ordered,
        number,
        content_offset: leading + marker_len + padding,
    })
}

/// Split a table row into raw cell sources, honouring `\|` escapes
fn split_row(line: &str) -> Vec<String> {
    let mut row = line.trim();
    row = row.strip_prefix('|').unwrap_or(row);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = row.chars();
    let mut trailing_pipe = false;
    while let Some(ch) = chars.next() {
        trailing_pipe = false;
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => {
                cells.push(current.trim().to_string());
                current.clear();
                trailing_pipe = true;
            }
            _ => current.push(ch),
        }
    }
    if !trailing_pipe {
        cells.push(current.trim().to_string());
    }
    cells
}

fn is_delimiter_cell(cell: &str) -> bool {
    let inner = cell.strip_prefix(':').unwrap_or(cell);
    let inner = inner.strip_suffix(':').unwrap_or(inner);
    !inner.is_empty() && inner.chars().all(|c| c == '-')
}

fn table_cell(source: &str, header: bool) -> TableCell {
    TableCell {
        header,
        content: parse_inline(source),
    }
}

/// Inline parser over logos tokens, producing merged text runs.
struct InlineParser<'src> {
    source: &'src str,
    tokens: Vec<(InlineToken, Range<usize>)>,
    runs: Vec<TextRun>,
}

impl<'src> InlineParser<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: tokenize_inline(source),
            runs: Vec::new(),
        }
    }

    fn push(&mut self, text: &str, marks: &[Mark]) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.marks == marks {
                last.text.push_str(text);
                return;
            }
        }
        self.runs.push(TextRun {
            text: text.to_string(),
            marks: marks.to_vec(),
        });
    }

    fn parse_span(&mut self, start: usize, end: usize, marks: &[Mark]) {
        let source = self.source;
        let mut i = start;
        while i < end {
            let (token, span) = self.tokens[i].clone();
            match token {
                InlineToken::Escape => {
                    self.push(&source[span.start + 1..span.end], marks);
                    i += 1;
                    continue;
                }
                InlineToken::Backtick => {
                    if let Some(close) = self.find_closing(i, end, token) {
                        let code = &source[span.end..self.tokens[close].1.start];
                        self.push(code, &Mark::Code.add_to(marks));
                        i = close + 1;
                        continue;
                    }
                }
                InlineToken::DoubleStar
                | InlineToken::DoubleUnderscore
                | InlineToken::Star
                | InlineToken::Underscore
                | InlineToken::DoubleTilde => {
                    let mark = match token {
                        InlineToken::DoubleStar | InlineToken::DoubleUnderscore => Mark::Bold,
                        InlineToken::DoubleTilde => Mark::Strike,
                        _ => Mark::Italic,
                    };
                    if self.can_open(i) {
                        if let Some(close) = self.find_closing(i, end, token) {
                            self.parse_span(i + 1, close, &mark.add_to(marks));
                            i = close + 1;
                            continue;
                        }
                    }
                }
                InlineToken::OpenBracket => {
                    if let Some((middle, close)) = self.find_link(i, end) {
                        let href = source[self.tokens[middle].1.end..self.tokens[close].1.start].trim();
                        let link = Mark::Link {
                            href: href.to_string(),
                        };
                        self.parse_span(i + 1, middle, &link.add_to(marks));
                        i = close + 1;
                        continue;
                    }
                }
                _ => {}
            }
            self.push(&source[span], marks);
            i += 1;
        }
    }

    fn can_open(&self, index: usize) -> bool {
        let span = &self.tokens[index].1;
        self.source[span.end..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace())
    }

    fn can_close(&self, index: usize) -> bool {
        let span = &self.tokens[index].1;
        self.source[..span.start]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace())
    }

    fn find_closing(&self, open: usize, end: usize, token: InlineToken) -> Option<usize> {
        let emphasis = token != InlineToken::Backtick;
        (open + 2..end).find(|&j| self.tokens[j].0 == token && (!emphasis || self.can_close(j)))
    }

    /// Locate `](` and the matching `)` of a link opened at `open`
    fn find_link(&self, open: usize, end: usize) -> Option<(usize, usize)> {
        let mut depth = 0usize;
        let mut middle = None;
        for j in open + 1..end {
            match self.tokens[j].0 {
                InlineToken::OpenBracket => depth += 1,
                InlineToken::CloseBracket if depth == 0 => return None,
                InlineToken::CloseBracket => depth -= 1,
                InlineToken::LinkMiddle if depth == 0 => {
                    middle = Some(j);
                    break;
                }
                InlineToken::LinkMiddle => depth -= 1,
                _ => {}
            }
        }
        let middle = middle.filter(|m| *m > open + 1)?;

        let mut parens = 0usize;
        for j in middle + 1..end {
            match self.tokens[j].0 {
                InlineToken::OpenParen => parens += 1,
                InlineToken::CloseParen if parens == 0 => return Some((middle, j)),
                InlineToken::CloseParen => parens -= 1,
                _ => {}
            }
        }
        None
    }
}

/// Parse inline markdown into text runs
pub fn parse_inline(source: &str) -> Vec<TextRun> {
    let mut parser = InlineParser::new(source);
    let len = parser.tokens.len();
    parser.parse_span(0, len, &[]);
    parser.runs
}

/// Parse markdown into a document tree
pub fn parse(source: &str) -> Document {
    Parser::new(source).parse_document()
}

/// Parse markdown into a block sequence, for splicing into an existing tree
pub fn parse_blocks(source: &str) -> Vec<Block> {
    parse(source).blocks
}
