//! # Payload Normalization
//!
//! Models report their edit through a tool call whose arguments are loosely
//! typed: ops may arrive as a JSON string or an array, text fields may be
//! blank or missing. Everything is normalized here before it reaches the
//! editor.

use crate::errors::AgentError;
use cowrite_editor::operations::OPERATION_NAMES;
use cowrite_editor::EditMode;
use serde_json::{Map, Value};

/// Tool output in a uniform shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPayload {
    pub summary: String,
    pub ack: String,
    pub reply: String,
    pub base_hash: Option<String>,
    pub ops: Option<Vec<Value>>,
    pub markdown: Option<String>,
}

impl NormalizedPayload {
    pub fn has_edit(&self) -> bool {
        self.ops.is_some() || self.markdown.is_some()
    }
}

/// The string, if it is a string with non-whitespace content
pub fn cleaned_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn coerce_ops(value: &Value) -> Option<Vec<Value>> {
    let ops: Vec<Value> = value
        .as_array()?
        .iter()
        .filter(|item| item.is_object())
        .cloned()
        .collect();
    if ops.is_empty() {
        None
    } else {
        Some(ops)
    }
}

/// Ops from either a JSON-encoded string or an array. Non-object items are
/// dropped; an empty result is `None`.
pub fn parse_ops(value: Option<&Value>) -> Option<Vec<Value>> {
    match value? {
        Value::String(text) => {
            if text.trim().is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(text) {
                Ok(decoded) => coerce_ops(&decoded),
                Err(e) => {
                    tracing::debug!(error = %e, "opsJson is not valid JSON");
                    None
                }
            }
        }
        other => coerce_ops(other),
    }
}

pub fn normalize_payload(payload: &Value) -> NormalizedPayload {
    let ops = parse_ops(payload.get("opsJson")).or_else(|| parse_ops(payload.get("ops")));

    NormalizedPayload {
        summary: cleaned_text(payload.get("summary")).unwrap_or_default(),
        ack: cleaned_text(payload.get("ack")).unwrap_or_default(),
        reply: cleaned_text(payload.get("reply")).unwrap_or_default(),
        base_hash: cleaned_text(payload.get("baseHash")),
        ops,
        markdown: cleaned_text(payload.get("markdown")),
    }
}

/// Light structural check of returned ops; reports the first problem
pub fn validate_ops(ops: &[Value]) -> Result<(), AgentError> {
    for op in ops {
        let op_type = op.get("op");
        let name = match op_type.and_then(Value::as_str) {
            Some(name) if OPERATION_NAMES.contains(&name) => name,
            _ => {
                let shown = match op_type {
                    Some(Value::String(name)) => name.clone(),
                    Some(other) => other.to_string(),
                    None => "null".to_string(),
                };
                return Err(AgentError::InvalidOps(format!("Invalid op type: {}", shown)));
            }
        };

        let needs_markdown = !matches!(name, "rename_heading" | "delete_section");
        if needs_markdown && cleaned_text(op.get("markdown")).is_none() {
            return Err(AgentError::InvalidOps("Missing markdown in op".to_string()));
        }
        if name != "append_markdown" && cleaned_text(op.get("heading")).is_none() {
            return Err(AgentError::InvalidOps("Missing heading in op".to_string()));
        }
        if name == "rename_heading" && cleaned_text(op.get("newHeading")).is_none() {
            return Err(AgentError::InvalidOps("Missing new heading in op".to_string()));
        }
    }
    Ok(())
}

/// The edit a payload carries for `mode`, validated. Mode A needs ops, mode
/// B needs markdown.
pub fn resolve_edit(mode: EditMode, payload: &NormalizedPayload) -> Result<(), AgentError> {
    match mode {
        EditMode::Operations => {
            let ops = payload.ops.as_deref().ok_or(AgentError::NoOps)?;
            validate_ops(ops)
        }
        EditMode::FullReplace => payload.markdown.as_ref().map(|_| ()).ok_or(AgentError::NoMarkdown),
    }
}

fn decode_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

fn item_type(item: &Value) -> Option<&str> {
    item.get("type").and_then(Value::as_str)
}

/// Dig the tool arguments out of a model run result.
///
/// Looked up in order: `final_output`, tool call output items in
/// `new_items`, then raw `output` items (function call arguments or function
/// results). Returns `None` when the tool was never called.
pub fn extract_tool_payload(result: &Value) -> Option<Value> {
    if let Some(final_output) = result.get("final_output") {
        if !final_output.is_null() {
            return decode_object(final_output).map(Value::Object);
        }
    }

    if let Some(items) = result.get("new_items").and_then(Value::as_array) {
        for item in items {
            if item_type(item) == Some("tool_call_output_item") {
                return item.get("output").and_then(decode_object).map(Value::Object);
            }
        }
    }

    let output = result.get("output").and_then(Value::as_array)?;
    for item in output {
        match item_type(item) {
            Some("tool_call" | "function_call") => {
                return item.get("arguments").and_then(decode_object).map(Value::Object);
            }
            Some("tool_result" | "function_result") => {
                let content = item.get("output").or_else(|| item.get("content"))?;
                return match content {
                    Value::String(_) => decode_object(content).map(Value::Object),
                    _ => None,
                };
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cleaned_text() {
        assert_eq!(cleaned_text(Some(&json!("  hi "))), Some("  hi ".to_string()));
        assert_eq!(cleaned_text(Some(&json!("   "))), None);
        assert_eq!(cleaned_text(Some(&json!(3))), None);
        assert_eq!(cleaned_text(None), None);
    }

    #[test]
    fn test_parse_ops_from_string_and_array() {
        let ops = parse_ops(Some(&json!(r#"[{"op":"append_markdown","markdown":"x"}, 4]"#))).unwrap();
        assert_eq!(ops.len(), 1);

        let ops = parse_ops(Some(&json!([{"op": "delete_section"}, "junk"]))).unwrap();
        assert_eq!(ops, vec![json!({"op": "delete_section"})]);

        assert_eq!(parse_ops(Some(&json!("not json"))), None);
        assert_eq!(parse_ops(Some(&json!("[]"))), None);
        assert_eq!(parse_ops(Some(&json!({"op": "append_markdown"}))), None);
    }

    #[test]
    fn test_normalize_prefers_ops_json() {
        let payload = json!({
            "summary": "Added tips",
            "ack": " ",
            "baseHash": "",
            "opsJson": "[{\"op\":\"append_markdown\",\"markdown\":\"## Tips\"}]",
            "ops": [{"op": "delete_section", "heading": "Intro"}],
            "markdown": null
        });
        let normalized = normalize_payload(&payload);
        assert_eq!(normalized.summary, "Added tips");
        assert_eq!(normalized.ack, "");
        assert_eq!(normalized.base_hash, None);
        assert_eq!(normalized.ops.unwrap()[0]["op"], "append_markdown");
        assert_eq!(normalized.markdown, None);

        let fallback = normalize_payload(&json!({"opsJson": "", "ops": [{"op": "delete_section", "heading": "Intro"}]}));
        assert_eq!(fallback.ops.unwrap()[0]["op"], "delete_section");
    }

    #[test]
    fn test_validate_ops_messages() {
        let check = |ops: Value| validate_ops(ops.as_array().unwrap()).map_err(|e| e.to_string());

        assert_eq!(check(json!([{"op": "explode"}])), Err("Invalid op type: explode".to_string()));
        assert_eq!(check(json!([{"markdown": "x"}])), Err("Invalid op type: null".to_string()));
        assert_eq!(
            check(json!([{"op": "insert_after_heading", "heading": "A"}])),
            Err("Missing markdown in op".to_string())
        );
        assert_eq!(
            check(json!([{"op": "replace_section_by_heading", "markdown": "x"}])),
            Err("Missing heading in op".to_string())
        );
        assert_eq!(
            check(json!([{"op": "rename_heading", "heading": "A"}])),
            Err("Missing new heading in op".to_string())
        );
        assert_eq!(
            check(json!([
                {"op": "delete_section", "heading": "A"},
                {"op": "rename_heading", "heading": "A", "newHeading": "B"},
                {"op": "append_markdown", "markdown": "x"}
            ])),
            Ok(())
        );
    }

    #[test]
    fn test_resolve_edit_by_mode() {
        let ops_only = normalize_payload(&json!({"ops": [{"op": "append_markdown", "markdown": "x"}]}));
        assert_eq!(resolve_edit(EditMode::Operations, &ops_only), Ok(()));
        assert_eq!(resolve_edit(EditMode::FullReplace, &ops_only), Err(AgentError::NoMarkdown));

        let markdown_only = normalize_payload(&json!({"markdown": "# New"}));
        assert_eq!(resolve_edit(EditMode::Operations, &markdown_only), Err(AgentError::NoOps));
        assert_eq!(resolve_edit(EditMode::FullReplace, &markdown_only), Ok(()));
    }

    #[test]
    fn test_extract_tool_payload() {
        let from_final = json!({"final_output": "{\"summary\": \"s\"}"});
        assert_eq!(extract_tool_payload(&from_final), Some(json!({"summary": "s"})));

        let from_items = json!({
            "final_output": null,
            "new_items": [
                {"type": "message_output_item"},
                {"type": "tool_call_output_item", "output": {"reply": "hi"}}
            ]
        });
        assert_eq!(extract_tool_payload(&from_items), Some(json!({"reply": "hi"})));

        let from_call = json!({
            "output": [{"type": "function_call", "arguments": "{\"opsJson\": \"[]\"}"}]
        });
        assert_eq!(extract_tool_payload(&from_call), Some(json!({"opsJson": "[]"})));

        assert_eq!(extract_tool_payload(&json!({"output": [{"type": "message"}]})), None);
        assert_eq!(extract_tool_payload(&json!({"final_output": "plain text"})), None);
    }
}
