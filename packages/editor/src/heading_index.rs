//! # Heading Index
//!
//! Ordered view of every heading in a tree, with the positions needed to
//! address sections. An index describes one tree state only: build a fresh
//! one after every mutation.

use cowrite_parser::ast::{plain_text, Block};
use cowrite_parser::Document as Tree;
use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    /// Start of the heading node
    pub position: usize,
    pub level: u8,
    /// Plain text, trimmed. Matching is case-sensitive.
    pub text: String,
    /// Node size, so the heading spans `position..position + size`
    pub size: usize,
}

impl HeadingEntry {
    pub fn end(&self) -> usize {
        self.position + self.size
    }

    /// Range of the heading's inline text
    pub fn text_range(&self) -> Range<usize> {
        self.position + 1..self.end() - 1
    }

    fn matches(&self, text: &str, level: Option<u8>) -> bool {
        self.text == text && level.map_or(true, |level| level == self.level)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadingIndex {
    entries: Vec<HeadingEntry>,
    doc_end: usize,
}

impl HeadingIndex {
    /// Collect headings in document order, nested ones included
    pub fn build(tree: &Tree) -> Self {
        let mut entries = Vec::new();
        tree.visit_blocks(|block, position, _depth| {
            if let Block::Heading { level, content } = block {
                entries.push(HeadingEntry {
                    position,
                    level: *level,
                    text: plain_text(content).trim().to_string(),
                    size: block.node_size(),
                });
            }
        });

        Self {
            entries,
            doc_end: tree.content_size(),
        }
    }

    pub fn entries(&self) -> &[HeadingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.text.as_str()).collect()
    }

    /// First heading whose text equals `text` (trimmed), optionally at a
    /// given level. Without a level the first match in document order wins.
    pub fn find(&self, text: &str, level: Option<u8>) -> Option<&HeadingEntry> {
        let text = text.trim();
        self.entries.iter().find(|entry| entry.matches(text, level))
    }

    /// Start of the next heading at the same or a shallower level, or the
    /// document end
    pub fn section_end(&self, entry: &HeadingEntry) -> usize {
        self.entries
            .iter()
            .find(|next| next.position > entry.position && next.level <= entry.level)
            .map_or(self.doc_end, |next| next.position)
    }

    /// The heading plus its body
    pub fn section_range(&self, entry: &HeadingEntry) -> Range<usize> {
        entry.position..self.section_end(entry)
    }

    /// Everything after the heading up to the section end
    pub fn body_range(&self, entry: &HeadingEntry) -> Range<usize> {
        entry.end()..self.section_end(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowrite_parser::parse;

    const DOC: &str = "# Title\n\nIntro\n\n## Overview\n\nText\n\n### Detail\n\nMore\n\n## Steps\n\n- a\n";

    #[test]
    fn test_build_collects_headings_in_order() {
        let index = HeadingIndex::build(&parse(DOC));
        assert_eq!(index.texts(), vec!["Title", "Overview", "Detail", "Steps"]);
        let levels: Vec<u8> = index.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_positions_match_tree() {
        let tree = parse(DOC);
        let index = HeadingIndex::build(&tree);
        for entry in index.entries() {
            let node = tree.node_at(entry.position).unwrap();
            assert_eq!(node.kind(), cowrite_parser::NodeKind::Heading);
            assert_eq!(node.node_size(), entry.size);
        }
        // "# Title" spans 0..7, its text 1..6
        assert_eq!(index.entries()[0].text_range(), 1..6);
    }

    #[test]
    fn test_section_ranges() {
        let tree = parse(DOC);
        let index = HeadingIndex::build(&tree);
        let overview = index.find("Overview", None).unwrap();
        let steps = index.find("Steps", Some(2)).unwrap();
        assert_eq!(index.section_end(overview), steps.position);
        assert_eq!(index.body_range(overview).start, overview.end());

        let detail = index.find("Detail", None).unwrap();
        assert_eq!(index.section_end(detail), steps.position);

        assert_eq!(index.section_end(steps), tree.content_size());
        let title = index.find("Title", None).unwrap();
        assert_eq!(index.section_range(title), 0..tree.content_size());
    }

    #[test]
    fn test_find_first_match_and_level_filter() {
        let tree = parse("## Notes\n\n### Notes\n\n## Notes\n");
        let index = HeadingIndex::build(&tree);
        assert_eq!(index.find("Notes", None).unwrap().position, 0);
        assert_eq!(index.find("  Notes ", Some(3)).unwrap().level, 3);
        assert!(index.find("notes", None).is_none());
        assert!(index.find("Notes", Some(7)).is_none());
    }

    #[test]
    fn test_nested_headings_are_indexed() {
        let tree = parse("- ## Inside\n\n  body\n");
        let index = HeadingIndex::build(&tree);
        assert_eq!(index.texts(), vec!["Inside"]);
        // list opens at 0, item at 1, heading at 2
        assert_eq!(index.entries()[0].position, 2);
    }
}
