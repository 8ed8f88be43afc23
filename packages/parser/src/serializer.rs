use crate::ast::*;

/// Serializer converts a document tree back to markdown.
///
/// Output is deterministic: blocks are separated by one blank line, lists are
/// written tight with `-` bullets and sequential numbers, emphasis uses `**`,
/// `_` and `~~`. Reparsing the output yields the same tree for anything the
/// parser produced.
pub struct Serializer {
    indent_string: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_string: " ".to_string(),
        }
    }

    /// Serialize a Document to markdown
    pub fn serialize(&self, doc: &Document) -> String {
        let mut output = self.serialize_blocks(&doc.blocks);
        if !output.is_empty() {
            output.push('\n');
        }
        output
    }

    /// Serialize a block sequence, without the trailing newline
    pub fn serialize_blocks(&self, blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|block| self.serialize_block(block))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn serialize_block(&self, block: &Block) -> String {
        match block {
            Block::Paragraph { content } => serialize_inline_with(content, true),
            Block::Heading { level, content } => self.serialize_heading(*level, content),
            Block::BulletList { items } => items
                .iter()
                .map(|item| self.serialize_list_item("- ", item))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::OrderedList { start, items } => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.serialize_list_item(&format!("{}. ", *start as usize + i), item))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::CodeBlock { language, text } => self.serialize_code_block(language.as_deref(), text),
            Block::Table { rows } => self.serialize_table(rows),
        }
    }

    fn serialize_heading(&self, level: u8, content: &[TextRun]) -> String {
        let hashes = "#".repeat(level as usize);
        let mut text = serialize_inline(content);
        if text.is_empty() {
            return hashes;
        }
        // A bare trailing hash would read as a closing sequence
        if text.ends_with('#') && !text.ends_with("\\#") {
            text.insert(text.len() - 1, '\\');
        }
        format!("{} {}", hashes, text)
    }

    fn serialize_list_item(&self, marker: &str, item: &ListItem) -> String {
        let mut body = String::new();
        for (i, child) in item.children.iter().enumerate() {
            if i > 0 {
                let nested_list = matches!(child, Block::BulletList { .. } | Block::OrderedList { .. });
                body.push_str(if nested_list { "\n" } else { "\n\n" });
            }
            body.push_str(&self.serialize_block(child));
        }

        let pad = self.indent_string.repeat(marker.len());
        let mut output = String::new();
        for (i, line) in body.split('\n').enumerate() {
            if i == 0 {
                if line.is_empty() {
                    output.push_str(marker.trim_end());
                } else {
                    output.push_str(marker);
                    output.push_str(line);
                }
                continue;
            }
            output.push('\n');
            if !line.is_empty() {
                output.push_str(&pad);
                output.push_str(line);
            }
        }
        output
    }

    fn serialize_code_block(&self, language: Option<&str>, text: &str) -> String {
        let longest_run = text
            .lines()
            .map(|line| line.trim_start().chars().take_while(|c| *c == '`').count())
            .max()
            .unwrap_or(0);
        let fence = "`".repeat(longest_run.max(2) + 1);
        let info = language.unwrap_or("");
        if text.is_empty() {
            format!("{}{}\n{}", fence, info, fence)
        } else {
            format!("{}{}\n{}\n{}", fence, info, text, fence)
        }
    }

    fn serialize_table(&self, rows: &[TableRow]) -> String {
        let Some((header, body)) = rows.split_first() else {
            return String::new();
        };
        let mut lines = vec![serialize_row(header)];
        lines.push(format!("|{}", " --- |".repeat(header.cells.len())));
        lines.extend(body.iter().map(serialize_row));
        lines.join("\n")
    }
}

fn serialize_row(row: &TableRow) -> String {
    let mut line = String::from("|");
    for cell in &row.cells {
        let text = serialize_inline(&cell.content).replace('|', "\\|");
        line.push(' ');
        line.push_str(&text);
        line.push_str(" |");
    }
    line
}

fn open_delimiter(mark: &Mark) -> &'static str {
    match mark {
        Mark::Link { .. } => "[",
        Mark::Bold => "**",
        Mark::Italic => "_",
        Mark::Strike => "~~",
        Mark::Code => "`",
    }
}

fn close_delimiter(mark: &Mark) -> String {
    match mark {
        Mark::Link { href } => format!("]({})", href),
        other => open_delimiter(other).to_string(),
    }
}

fn escape_text(text: &str, at_line_start: bool, escape_line_starts: bool, output: &mut String) {
    let mut line_start = at_line_start;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        let after = &rest[ch.len_utf8()..];
        if line_start && escape_line_starts {
            match ch {
                '#' => output.push('\\'),
                '-' | '+' if after.is_empty() || after.starts_with(' ') => output.push('\\'),
                '0'..='9' => {
                    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
                    let tail = &rest[digits..];
                    if tail.starts_with('.') || tail.starts_with(')') {
                        let marker_end = &tail[1..];
                        if marker_end.is_empty() || marker_end.starts_with(' ') {
                            output.push_str(&rest[..digits]);
                            output.push('\\');
                            output.push_str(&tail[..1]);
                            rest = marker_end;
                            line_start = false;
                            continue;
                        }
                    }
                }
                _ => {}
            }
        }
        if matches!(ch, '\\' | '*' | '_' | '~' | '`' | '[' | ']') {
            output.push('\\');
        }
        output.push(ch);
        line_start = ch == '\n';
        rest = after;
    }
}

fn serialize_inline_with(content: &[TextRun], escape_line_starts: bool) -> String {
    let mut output = String::new();
    let mut active: Vec<&Mark> = Vec::new();

    for run in content {
        // Close everything from the first active mark this run drops
        let keep = active
            .iter()
            .position(|mark| !run.marks.contains(mark))
            .unwrap_or(active.len());
        while active.len() > keep {
            if let Some(mark) = active.pop() {
                output.push_str(&close_delimiter(mark));
            }
        }
        for mark in &run.marks {
            if !active.contains(&mark) {
                output.push_str(open_delimiter(mark));
                active.push(mark);
            }
        }

        if run.has_mark(&Mark::Code) {
            output.push_str(&run.text);
        } else {
            let at_line_start = output.is_empty() || output.ends_with('\n');
            escape_text(&run.text, at_line_start, escape_line_starts, &mut output);
        }
    }

    while let Some(mark) = active.pop() {
        output.push_str(&close_delimiter(mark));
    }
    output
}

/// Serialize inline content
pub fn serialize_inline(content: &[TextRun]) -> String {
    serialize_inline_with(content, false)
}

/// Serialize a document to markdown
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(source: &str) -> String {
        let first = serialize(&parse(source));
        let second = serialize(&parse(&first));
        assert_eq!(first, second, "serializer output is not stable");
        first
    }

    #[test]
    fn test_serialize_heading_and_paragraph() {
        let doc = Document::from_blocks(vec![Block::heading(2, "Steps"), Block::paragraph("Do it.")]);
        assert_eq!(serialize(&doc), "## Steps\n\nDo it.\n");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(serialize(&Document::new()), "");
    }

    #[test]
    fn test_serialize_ordered_list_numbers_from_start() {
        let doc = parse("3. a\n7. b");
        assert_eq!(serialize(&doc), "3. a\n4. b\n");
    }

    #[test]
    fn test_nested_list_indentation() {
        assert_eq!(
            roundtrip("- parent\n    - child\n\n      more\n- next"),
            "- parent\n  - child\n\n    more\n- next\n"
        );
    }

    #[test]
    fn test_inline_marks_roundtrip() {
        assert_eq!(
            roundtrip("Some *emph*, __strong__ and `co*de` with [a **link**](https://x.dev)."),
            "Some _emph_, **strong** and `co*de` with [a **link**](https://x.dev).\n"
        );
    }

    #[test]
    fn test_line_starts_are_escaped() {
        let doc = Document::from_blocks(vec![Block::paragraph("# not\n- heading\n1. list")]);
        let markdown = serialize(&doc);
        assert_eq!(markdown, "\\# not\n\\- heading\n1\\. list\n");
        assert_eq!(parse(&markdown), doc);
    }

    #[test]
    fn test_heading_trailing_hash_escaped() {
        let doc = Document::from_blocks(vec![Block::heading(2, "Issue #")]);
        let markdown = serialize(&doc);
        assert_eq!(markdown, "## Issue \\#\n");
        assert_eq!(parse(&markdown), doc);
    }

    #[test]
    fn test_code_fence_grows_past_content() {
        let doc = Document::from_blocks(vec![Block::CodeBlock {
            language: Some("md".to_string()),
            text: "```\ninner\n```".to_string(),
        }]);
        let markdown = serialize(&doc);
        assert!(markdown.starts_with("````md\n"));
        assert_eq!(parse(&markdown), doc);
    }

    #[test]
    fn test_table_roundtrip() {
        assert_eq!(
            roundtrip("|A|B|\n|-|-|\n|1|x \\| y|"),
            "| A | B |\n| --- | --- |\n| 1 | x \\| y |\n"
        );
    }

    #[test]
    fn test_mixed_document_is_stable() {
        roundtrip(
            "# Plan\n\nIntro with _style_ and ~~old~~ text.\n\n## Steps\n\n1. First\n2. Second\n   - detail\n3. Third\n\n```sh\ncargo run\n```\n\n| k | v |\n|---|---|\n| a | b |\n\n## Risks\n\n- None yet\n",
        );
    }
}
