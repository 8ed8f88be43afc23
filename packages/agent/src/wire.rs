//! Request and response bodies exchanged with the agent server

use cowrite_editor::{AgentEdit, AgentRequest, AgentResponse, EditMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default)]
    pub recent_revision: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub base_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_hints: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub summary: String,
    pub ack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub mode: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub base_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_hints: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_hash: Option<String>,
}

impl From<&AgentRequest> for EditRequest {
    fn from(request: &AgentRequest) -> Self {
        Self {
            mode: request.mode.as_str().to_string(),
            markdown: Some(request.markdown.clone()),
            recent_revision: request.recent_revision.clone(),
            instruction: Some(request.instruction.clone()),
            base_hash: Some(request.base_hash.to_string()),
            schema_hints: None,
        }
    }
}

impl EditResponse {
    /// Convert into the editor's view of a response for the given mode
    pub fn into_agent_response(self, mode: EditMode) -> AgentResponse {
        let edit = match (mode, self.ops, self.markdown) {
            (EditMode::Operations, Some(ops), _) => AgentEdit::Operations(ops),
            (EditMode::FullReplace, _, Some(markdown)) => AgentEdit::Replacement(markdown),
            _ => AgentEdit::None,
        };
        let reply = match self.reply {
            Some(reply) if !reply.trim().is_empty() => reply,
            _ => self.ack,
        };

        AgentResponse {
            edit,
            summary: self.summary,
            reply,
            base_hash: self.base_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edit_request_uses_camel_case() {
        let request: EditRequest = serde_json::from_value(json!({
            "mode": "A",
            "markdown": "# Doc",
            "recentRevision": "Initial version",
            "baseHash": "5-abc"
        }))
        .unwrap();
        assert_eq!(request.recent_revision.as_deref(), Some("Initial version"));
        assert_eq!(request.base_hash.as_deref(), Some("5-abc"));
        assert_eq!(request.instruction, None);
    }

    #[test]
    fn test_chat_response_skips_empty_fields() {
        let response = ChatResponse {
            reply: "Okay.".to_string(),
            session_id: Some("default".to_string()),
            ..ChatResponse::default()
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"reply": "Okay.", "sessionId": "default"})
        );
    }

    #[test]
    fn test_into_agent_response() {
        let response = EditResponse {
            summary: "Added tips".to_string(),
            ack: "Saw Initial version".to_string(),
            ops: Some(vec![json!({"op": "append_markdown", "markdown": "x"})]),
            base_hash: Some("1-00000000".to_string()),
            ..EditResponse::default()
        };
        let converted = response.into_agent_response(EditMode::Operations);
        assert!(matches!(converted.edit, AgentEdit::Operations(ref ops) if ops.len() == 1));
        assert_eq!(converted.reply, "Saw Initial version");
        assert_eq!(converted.base_hash.as_deref(), Some("1-00000000"));
    }
}
