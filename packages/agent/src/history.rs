//! Per-session chat history, kept short so prompts stay bounded

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_SESSION_ITEMS: usize = 12;
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatItem {
    pub role: String,
    pub content: String,
}

impl ChatItem {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatHistory {
    sessions: HashMap<String, Vec<ChatItem>>,
    max_items: usize,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::with_max_items(MAX_SESSION_ITEMS)
    }

    pub fn with_max_items(max_items: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_items,
        }
    }

    pub fn items(&self, session_id: &str) -> &[ChatItem] {
        self.sessions.get(session_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append one user/assistant exchange and trim to the newest items
    pub fn record_exchange(&mut self, session_id: &str, message: &str, reply: &str) {
        let items = self.sessions.entry(session_id.to_string()).or_default();
        items.push(ChatItem::user(message));
        items.push(ChatItem::assistant(reply));
        if items.len() > self.max_items {
            let excess = items.len() - self.max_items;
            items.drain(..excess);
        }
    }

    pub fn clear(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}
