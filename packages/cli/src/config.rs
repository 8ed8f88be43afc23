use cowrite_editor::{EditMode, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "cowrite.config.json";

/// Cowrite configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Editing mode for agent rounds ("A" = operations, "B" = full replace)
    #[serde(default)]
    pub mode: EditMode,

    /// Seconds to wait for the agent before giving up on a round
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,

    /// Failure messages shown when a batch partially applies
    #[serde(default = "default_max_warning_messages")]
    pub max_warning_messages: usize,

    /// Revisions kept per mode (0 = unlimited)
    #[serde(default)]
    pub max_revisions: usize,

    /// Session id used to scope revision ids and chat history
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_agent_timeout_secs() -> u64 {
    60
}

fn default_max_warning_messages() -> usize {
    3
}

fn default_session_id() -> String {
    "default".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mode: self.mode,
            agent_timeout: Duration::from_secs(self.agent_timeout_secs),
            max_warning_messages: self.max_warning_messages,
            max_revisions: self.max_revisions,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: EditMode::Operations,
            agent_timeout_secs: default_agent_timeout_secs(),
            max_warning_messages: default_max_warning_messages(),
            max_revisions: 0,
            session_id: default_session_id(),
        }
    }
}
