use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use cowrite_agent::normalize_payload;
use cowrite_editor::{ApplyReport, Document, EditorError, OperationEngine};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Markdown document to edit
    pub input: PathBuf,

    /// JSON file with the operations: an array, or an object with `ops` or `opsJson`
    #[arg(short, long)]
    pub ops: PathBuf,

    /// Write the result back to the document
    #[arg(short, long)]
    pub write: bool,

    /// Print the resulting markdown
    #[arg(long)]
    pub print: bool,
}

/// Read an operation batch from disk
pub fn load_ops(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match value {
        Value::Array(ops) => Ok(ops),
        other => normalize_payload(&other)
            .ops
            .ok_or_else(|| anyhow::anyhow!("No operations found in {}", path.display())),
    }
}

pub fn print_report(report: &ApplyReport, warning: Option<String>) {
    println!(
        "   {} {}/{} ops applied",
        if report.is_failure() { "✗".red() } else { "✓".green() },
        report.applied_count,
        report.total
    );
    if let Some(warning) = warning {
        println!("   {} {}", "Warning:".yellow(), warning);
    }
}

pub fn apply(args: ApplyArgs, config: &Config) -> Result<()> {
    let ops = load_ops(&args.ops)?;
    let mut doc = Document::load(&args.input)?;
    let engine = OperationEngine::with_max_warning_messages(config.max_warning_messages);

    println!("📝 {} {} ops to {}", "Applying".green().bold(), ops.len(), args.input.display());
    let report = engine.apply_json_batch(&mut doc, &ops);
    print_report(&report, engine.warning(&report));

    if report.is_failure() {
        return Err(EditorError::BatchFailed { errors: report.errors }.into());
    }

    if args.print {
        println!();
        print!("{}", doc.to_markdown());
    }

    if args.write {
        doc.save()?;
        println!("   {} {}", "Saved".green(), args.input.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_ops_formats() {
        let dir = tempfile::tempdir().unwrap();

        let array = dir.path().join("array.json");
        std::fs::write(&array, r#"[{"op": "delete_section", "heading": "A"}]"#).unwrap();
        assert_eq!(load_ops(&array).unwrap().len(), 1);

        let payload = dir.path().join("payload.json");
        std::fs::write(
            &payload,
            r#"{"summary": "s", "opsJson": "[{\"op\": \"append_markdown\", \"markdown\": \"x\"}]"}"#,
        )
        .unwrap();
        assert_eq!(load_ops(&payload).unwrap()[0]["op"], "append_markdown");

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{"summary": "nothing"}"#).unwrap();
        assert!(load_ops(&empty).is_err());
    }

    #[test]
    fn test_apply_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("plan.md");
        let ops = dir.path().join("ops.json");
        std::fs::write(&doc, "## Risks\n\n- Slips\n").unwrap();
        std::fs::write(&ops, r#"[{"op": "rename_heading", "heading": "Risks", "newHeading": "Open Risks"}]"#).unwrap();

        apply(
            ApplyArgs {
                input: doc.clone(),
                ops,
                write: true,
                print: false,
            },
            &Config::default(),
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), "## Open Risks\n\n- Slips\n");
    }

    #[test]
    fn test_apply_fails_when_nothing_applied() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("plan.md");
        let ops = dir.path().join("ops.json");
        std::fs::write(&doc, "## Risks\n").unwrap();
        std::fs::write(&ops, r#"[{"op": "delete_section", "heading": "Missing"}]"#).unwrap();

        let err = apply(
            ApplyArgs {
                input: doc.clone(),
                ops,
                write: true,
                print: false,
            },
            &Config::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Heading not found: Missing"));
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), "## Risks\n");
    }
}
