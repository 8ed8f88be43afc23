//! Session configuration

use crate::engine::DEFAULT_MAX_WARNING_MESSAGES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How an agent round changes the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditMode {
    /// Heading-addressed operation batches ("A")
    #[default]
    #[serde(rename = "A")]
    Operations,

    /// Whole-document replacement ("B")
    #[serde(rename = "B")]
    FullReplace,
}

impl EditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Operations => "A",
            EditMode::FullReplace => "B",
        }
    }

    /// Lenient parse: anything but "B" means operations
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "OPS" | "OPERATIONS" => Ok(EditMode::Operations),
            "B" | "REPLACE" | "FULL" => Ok(EditMode::FullReplace),
            other => Err(format!("unknown edit mode: {}", other)),
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub mode: EditMode,

    /// How long a round may wait on the agent
    pub agent_timeout: Duration,

    /// Failure messages shown in a partial-apply warning
    pub max_warning_messages: usize,

    /// Revisions kept per mode (0 = unlimited)
    pub max_revisions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: EditMode::Operations,
            agent_timeout: Duration::from_secs(60),
            max_warning_messages: DEFAULT_MAX_WARNING_MESSAGES,
            max_revisions: 0,
        }
    }
}
