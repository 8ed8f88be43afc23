use cowrite_editor::{fingerprint, Document, HeadingIndex, OperationEngine};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

fn sample_document(sections: usize) -> String {
    let mut source = String::from("# Handbook\n\n");
    for i in 0..sections {
        source.push_str(&format!(
            "## Section {}\n\nBody text for section {} with **bold** words.\n\n- item a\n- item b\n\n",
            i, i
        ));
    }
    source
}

fn sample_batch(sections: usize) -> Vec<Value> {
    let mut ops = Vec::new();
    for i in (0..sections).step_by(10) {
        ops.push(json!({"op": "rename_heading", "heading": format!("Section {}", i), "newHeading": format!("Part {}", i)}));
        ops.push(json!({"op": "insert_after_heading", "heading": format!("Section {}", i + 1), "markdown": "Added note."}));
    }
    ops.push(json!({"op": "append_markdown", "markdown": "## Appendix\n\nDone."}));
    ops
}

fn bench_heading_index(c: &mut Criterion) {
    let doc = Document::from_markdown("bench.md", &sample_document(200));

    c.bench_function("build_heading_index_200_sections", |b| {
        b.iter(|| HeadingIndex::build(black_box(doc.tree())))
    });
}

fn bench_fingerprint(c: &mut Criterion) {
    let doc = Document::from_markdown("bench.md", &sample_document(200));

    c.bench_function("fingerprint_200_sections", |b| b.iter(|| fingerprint(black_box(doc.tree()))));
}

fn bench_apply_batch(c: &mut Criterion) {
    let doc = Document::from_markdown("bench.md", &sample_document(200));
    let batch = sample_batch(200);
    let engine = OperationEngine::new();

    c.bench_function("apply_batch_41_ops", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            engine.apply_json_batch(&mut doc, black_box(&batch))
        })
    });
}

criterion_group!(benches, bench_heading_index, bench_fingerprint, bench_apply_batch);
criterion_main!(benches);
