//! # Operation Engine
//!
//! Applies an ordered batch of operations to a document. Operations run
//! sequentially, each against the tree left by the previous one, and each
//! resolves its heading against a fresh index. A failing operation records
//! its message and the batch moves on; the batch as a whole only fails when
//! nothing was applied.

use crate::operations::{decode_operation, OpError, Operation};
use crate::{Document, EditorError};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_MAX_WARNING_MESSAGES: usize = 3;

/// Outcome of one batch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub applied_count: usize,
    pub errors: Vec<String>,
    pub total: usize,
}

impl ApplyReport {
    pub fn is_failure(&self) -> bool {
        self.applied_count == 0
    }

    pub fn is_partial(&self) -> bool {
        self.applied_count > 0 && !self.errors.is_empty()
    }

    /// Operator-facing summary of failed operations, capped to the first
    /// `max_messages` errors. `None` when everything applied.
    pub fn warning(&self, max_messages: usize) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let shown: Vec<&str> = self
            .errors
            .iter()
            .take(max_messages)
            .map(String::as_str)
            .collect();
        let mut message = format!(
            "Applied {}/{} ops. Failed: {}",
            self.applied_count,
            self.total,
            shown.join("; ")
        );
        if self.errors.len() > shown.len() {
            message.push_str(&format!(" (+{} more)", self.errors.len() - shown.len()));
        }
        Some(message)
    }

    fn record(&mut self, result: Result<(), OpError>) {
        self.total += 1;
        match result {
            Ok(()) => self.applied_count += 1,
            Err(e) => self.errors.push(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationEngine {
    max_warning_messages: usize,
}

impl Default for OperationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationEngine {
    pub fn new() -> Self {
        Self::with_max_warning_messages(DEFAULT_MAX_WARNING_MESSAGES)
    }

    pub fn with_max_warning_messages(max_warning_messages: usize) -> Self {
        Self {
            max_warning_messages,
        }
    }

    pub fn warning(&self, report: &ApplyReport) -> Option<String> {
        report.warning(self.max_warning_messages)
    }

    /// Apply typed operations in order
    pub fn apply_batch(&self, doc: &mut Document, operations: &[Operation]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (index, operation) in operations.iter().enumerate() {
            report.record(self.apply_one(doc, index, operation));
        }
        self.log_report(&report);
        report
    }

    /// Apply raw JSON operations in order, decoding each element on its own
    pub fn apply_json_batch(&self, doc: &mut Document, operations: &[Value]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (index, value) in operations.iter().enumerate() {
            let result = match decode_operation(value) {
                Ok(operation) => self.apply_one(doc, index, &operation),
                Err(e) => {
                    tracing::warn!(index, error = %e, "could not decode operation");
                    Err(e)
                }
            };
            report.record(result);
        }
        self.log_report(&report);
        report
    }

    /// Like [`apply_batch`](Self::apply_batch), but a batch that applied
    /// nothing is an error
    pub fn apply_batch_or_fail(&self, doc: &mut Document, operations: &[Operation]) -> Result<ApplyReport, EditorError> {
        let report = self.apply_batch(doc, operations);
        if report.is_failure() {
            return Err(EditorError::BatchFailed { errors: report.errors });
        }
        Ok(report)
    }

    fn apply_one(&self, doc: &mut Document, index: usize, operation: &Operation) -> Result<(), OpError> {
        let (heading, level) = operation.target().unwrap_or_default();
        tracing::debug!(index, op = operation.name(), heading, ?level, "applying operation");

        let result = doc.apply(operation);
        if let Err(e) = &result {
            tracing::warn!(index, op = operation.name(), error = %e, "operation failed");
        }
        result
    }

    fn log_report(&self, report: &ApplyReport) {
        if report.is_failure() {
            tracing::warn!(total = report.total, "no operations applied");
        } else {
            tracing::debug!(
                applied = report.applied_count,
                failed = report.errors.len(),
                total = report.total,
                "batch applied"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = "## Overview\n\nIntro.\n\n## Steps\n\n1. One\n\n## Risks\n\n- Slips\n";

    fn doc() -> Document {
        Document::from_markdown("plan.md", DOC)
    }

    #[test]
    fn test_partial_batch() {
        let mut doc = doc();
        let report = OperationEngine::new().apply_json_batch(
            &mut doc,
            &[
                json!({"op": "rename_heading", "heading": "Missing", "newHeading": "X"}),
                json!({"op": "append_markdown", "markdown": "## New\nbody"}),
            ],
        );
        assert_eq!(report.applied_count, 1);
        assert_eq!(report.errors, vec!["Heading not found: Missing"]);
        assert!(!report.is_failure());
        assert!(report.is_partial());
        assert_eq!(doc.headings().texts(), vec!["Overview", "Steps", "Risks", "New"]);
    }

    #[test]
    fn test_later_ops_see_earlier_mutations() {
        let mut doc = doc();
        let report = OperationEngine::new().apply_batch(
            &mut doc,
            &[
                Operation::InsertAfterHeading {
                    heading: "Overview".to_string(),
                    level: Some(2),
                    markdown: "## Goals\n\nShip it.".to_string(),
                },
                Operation::DeleteSection {
                    heading: "Goals".to_string(),
                    level: Some(2),
                },
                Operation::RenameHeading {
                    heading: "Risks".to_string(),
                    new_heading: "Open Risks".to_string(),
                    level: None,
                },
            ],
        );
        assert_eq!(report.applied_count, 3);
        // The inserted "Goals" section swallowed the old Overview body, and
        // deleting it took that body along
        assert_eq!(doc.headings().texts(), vec!["Overview", "Steps", "Open Risks"]);
        assert_eq!(doc.to_markdown(), "## Overview\n\n## Steps\n\n1. One\n\n## Open Risks\n\n- Slips\n");
    }

    #[test]
    fn test_unknown_and_invalid_elements() {
        let mut doc = doc();
        let report = OperationEngine::new().apply_json_batch(
            &mut doc,
            &[json!({"op": "explode"}), json!(42), json!({"op": "append_markdown"})],
        );
        assert!(report.is_failure());
        assert_eq!(
            report.errors,
            vec!["Unknown op: explode", "Invalid op payload", "Missing markdown in op"]
        );
        assert_eq!(doc.to_markdown(), DOC);
    }

    #[test]
    fn test_apply_batch_or_fail() {
        let engine = OperationEngine::new();
        let mut doc = doc();
        let err = engine
            .apply_batch_or_fail(
                &mut doc,
                &[Operation::DeleteSection {
                    heading: "Nope".to_string(),
                    level: None,
                }],
            )
            .unwrap_err();
        match err {
            EditorError::BatchFailed { errors } => assert_eq!(errors, vec!["Heading not found: Nope"]),
            other => panic!("unexpected error {:?}", other),
        }

        let empty = engine.apply_batch_or_fail(&mut doc, &[]);
        assert!(matches!(empty, Err(EditorError::BatchFailed { .. })));
    }

    #[test]
    fn test_warning_is_capped() {
        let report = ApplyReport {
            applied_count: 1,
            errors: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            total: 6,
        };
        assert_eq!(
            report.warning(3).unwrap(),
            "Applied 1/6 ops. Failed: a; b; c (+2 more)"
        );
        assert_eq!(
            OperationEngine::with_max_warning_messages(5).warning(&report).unwrap(),
            "Applied 1/6 ops. Failed: a; b; c; d; e"
        );
        assert!(ApplyReport::default().warning(3).is_none());
    }

    #[test]
    fn test_report_accounting() {
        let mut doc = doc();
        let batch = vec![
            json!({"op": "delete_section", "heading": "Risks"}),
            json!({"op": "delete_section", "heading": "Risks"}),
            json!({"op": "insert_after_heading", "heading": "Steps", "markdown": "2. Two"}),
        ];
        let report = OperationEngine::new().apply_json_batch(&mut doc, &batch);
        assert_eq!(report.total, batch.len());
        assert_eq!(report.applied_count + report.errors.len(), batch.len());
        assert_eq!(report.applied_count, 2);
    }
}
