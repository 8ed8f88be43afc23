//! Integration tests for heading-addressed operation batches

use cowrite_editor::{fingerprint, Document, OperationEngine, Operation};
use cowrite_parser::ast::{plain_text, Block};
use serde_json::json;

const PLAN: &str = "## Overview\n\nWhy we ship.\n\n## Steps\n\n1. One\n2. Two\n3. Three\n\n## Risks\n\n- Slips\n- Scope creep\n";

fn plan() -> Document {
    Document::from_markdown("plan.md", PLAN)
}

/// Saving and reloading must give back the same document
fn assert_reloads_unchanged(doc: &Document) {
    let markdown = doc.to_markdown();
    let reloaded = cowrite_parser::parse(&markdown);
    assert_eq!(cowrite_parser::serialize(&reloaded), markdown);
    assert_eq!(&reloaded, doc.tree());
    assert_eq!(fingerprint(&reloaded), doc.fingerprint());
}

fn ordered_items(block: &Block) -> Vec<String> {
    match block {
        Block::OrderedList { items, .. } => items
            .iter()
            .filter_map(|item| item.children.first())
            .filter_map(|child| child.inline_content())
            .map(plain_text)
            .collect(),
        _ => Vec::new(),
    }
}

#[test]
fn test_rename_scenario() {
    let mut doc = plan();
    let report = OperationEngine::new().apply_json_batch(
        &mut doc,
        &[json!({"op": "rename_heading", "heading": "Risks", "newHeading": "Open Risks"})],
    );

    assert_eq!(report.applied_count, 1);
    assert!(report.errors.is_empty());
    assert_eq!(doc.headings().texts(), vec!["Overview", "Steps", "Open Risks"]);
    assert_eq!(doc.to_markdown(), PLAN.replace("## Risks", "## Open Risks"));
    assert_reloads_unchanged(&doc);
}

#[test]
fn test_insert_after_heading_scenario() {
    let mut doc = plan();
    let risks_before = doc.headings().find("Risks", Some(2)).unwrap().position;
    let size_before = doc.tree().content_size();
    // The new item joins the existing list, so only the item itself is added
    let inserted = cowrite_parser::parse_blocks("4. Review");
    let item_size = inserted[0].node_size() - 2;

    let report = OperationEngine::new().apply_json_batch(
        &mut doc,
        &[json!({"op": "insert_after_heading", "heading": "Steps", "level": 2, "markdown": "4. Review"})],
    );
    assert_eq!(report.applied_count, 1);
    assert_eq!(doc.tree().content_size(), size_before + item_size);

    // The section body holds the original three items followed by item four
    let index = doc.headings();
    let steps = index.find("Steps", Some(2)).unwrap();
    let body = index.body_range(steps);
    let mut lists = Vec::new();
    doc.tree().visit_blocks(|block, pos, depth| {
        if depth == 0 && pos >= body.start && pos < body.end {
            lists.push(ordered_items(block));
        }
    });
    assert_eq!(lists, vec![vec!["One", "Two", "Three", "Review"]]);
    assert!(doc
        .to_markdown()
        .contains("## Steps\n\n1. One\n2. Two\n3. Three\n4. Review\n\n## Risks"));

    // Risks is untouched and shifted by exactly the inserted size
    let risks_after = index.find("Risks", Some(2)).unwrap().position;
    assert_eq!(risks_after, risks_before + item_size);
    assert!(doc.to_markdown().ends_with("## Risks\n\n- Slips\n- Scope creep\n"));
    assert_reloads_unchanged(&doc);
}

#[test]
fn test_partial_batch_scenario() {
    let mut doc = plan();
    let report = OperationEngine::new().apply_json_batch(
        &mut doc,
        &[
            json!({"op": "rename_heading", "heading": "Missing", "newHeading": "X"}),
            json!({"op": "append_markdown", "markdown": "## New\nbody"}),
        ],
    );

    assert_eq!(report.applied_count, 1);
    assert_eq!(report.errors, vec!["Heading not found: Missing"]);
    assert_eq!(doc.headings().texts().last(), Some(&"New"));
    assert!(doc.to_markdown().ends_with("## New\n\nbody\n"));
    assert_reloads_unchanged(&doc);
}

#[test]
fn test_deleted_heading_leaves_index() {
    for heading in ["Overview", "Steps", "Risks"] {
        let mut doc = plan();
        doc.apply(&Operation::DeleteSection {
            heading: heading.to_string(),
            level: None,
        })
        .unwrap();
        assert!(doc.headings().find(heading, None).is_none(), "{} still indexed", heading);
        assert_reloads_unchanged(&doc);
    }
}

#[test]
fn test_rename_to_same_text_is_byte_identical() {
    let mut doc = plan();
    for heading in ["Overview", "Steps", "Risks"] {
        doc.apply(&Operation::RenameHeading {
            heading: heading.to_string(),
            new_heading: heading.to_string(),
            level: None,
        })
        .unwrap();
    }
    assert_eq!(doc.to_markdown(), PLAN);
}

#[test]
fn test_applied_plus_errors_never_exceeds_batch() {
    let batches = vec![
        vec![],
        vec![json!({"op": "delete_section", "heading": "Steps"})],
        vec![
            json!({"op": "delete_section", "heading": "Steps"}),
            json!({"op": "delete_section", "heading": "Steps"}),
            json!({"op": "bogus"}),
        ],
        vec![
            json!({"op": "replace_section_by_heading", "heading": "Risks", "markdown": "## Risks\n\nNone."}),
            json!({"op": "insert_after_heading", "heading": "Overview"}),
            json!("not an op"),
        ],
    ];

    let engine = OperationEngine::new();
    for batch in batches {
        let mut doc = plan();
        let report = engine.apply_json_batch(&mut doc, &batch);
        assert!(report.applied_count + report.errors.len() <= batch.len());
        assert_eq!(report.is_failure(), report.applied_count == 0);
        assert_reloads_unchanged(&doc);
    }
}

#[test]
fn test_positions_recomputed_between_operations() {
    let mut doc = plan();
    let report = OperationEngine::new().apply_json_batch(
        &mut doc,
        &[
            json!({"op": "delete_section", "heading": "Overview"}),
            json!({"op": "replace_section_by_heading", "heading": "Risks", "markdown": "Nothing known."}),
            json!({"op": "insert_after_heading", "heading": "Steps", "markdown": "Follow in order."}),
        ],
    );
    assert_eq!(report.applied_count, 3);
    assert_eq!(
        doc.to_markdown(),
        "## Steps\n\nFollow in order.\n\n1. One\n2. Two\n3. Three\n\n## Risks\n\nNothing known.\n"
    );
}

#[test]
fn test_fingerprint_tracks_content() {
    let mut doc = plan();
    let before = doc.fingerprint();
    assert_eq!(before, doc.fingerprint());
    assert_eq!(before, fingerprint(&cowrite_parser::parse(PLAN)));

    doc.apply(&Operation::AppendMarkdown {
        markdown: "Footnote.".to_string(),
    })
    .unwrap();
    assert_ne!(before, doc.fingerprint());
}

#[test]
fn test_edits_next_to_lists_survive_reload() {
    let batches = vec![
        // New bullets right after a heading whose body is a bullet list
        vec![json!({"op": "insert_after_heading", "heading": "Risks", "markdown": "- Budget"})],
        // Content ending in a list meets the list that opens the body
        vec![json!({"op": "insert_after_heading", "heading": "Steps", "markdown": "Before you start:\n\n1. Read the brief"})],
        vec![json!({"op": "append_markdown", "markdown": "- Vendor lock-in"})],
        vec![json!({"op": "replace_section_by_heading", "heading": "Overview", "markdown": "1. Why\n2. How"})],
        vec![json!({"op": "rename_heading", "heading": "Steps", "newHeading": "Next\nSteps"})],
    ];

    let engine = OperationEngine::new();
    for batch in batches {
        let mut doc = plan();
        let report = engine.apply_json_batch(&mut doc, &batch);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_reloads_unchanged(&doc);
    }

    let mut doc = plan();
    engine.apply_json_batch(
        &mut doc,
        &[json!({"op": "insert_after_heading", "heading": "Risks", "markdown": "- Budget"})],
    );
    assert!(doc.to_markdown().ends_with("## Risks\n\n- Slips\n- Scope creep\n- Budget\n"));
}
