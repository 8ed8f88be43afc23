//! Replays recorded model results instead of calling a model. Used by the
//! CLI to run rounds against a saved response, and by tests.

use crate::errors::AgentError;
use crate::history::ChatItem;
use crate::service::{AgentService, ModelRunner};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ScriptedModel {
    results: Mutex<VecDeque<Result<Value, AgentError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw run result
    pub fn push_result(&self, result: Result<Value, AgentError>) {
        if let Ok(mut results) = self.results.lock() {
            results.push_back(result);
        }
    }

    /// Queue tool arguments, wrapped as the run's final output
    pub fn push_payload(&self, payload: Value) {
        self.push_result(Ok(json!({ "final_output": payload })));
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|prompts| prompts.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.results.lock().map(|results| results.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ModelRunner for ScriptedModel {
    async fn run(&self, prompt: &str, _history: &[ChatItem]) -> Result<Value, AgentError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self.results.lock().ok().and_then(|mut results| results.pop_front());
        next.unwrap_or_else(|| Err(AgentError::model("no scripted result left")))
    }
}

/// An agent service answering from a script
pub type ScriptedAgent = AgentService<ScriptedModel>;

impl AgentService<ScriptedModel> {
    /// Service that answers each request with the next payload
    pub fn scripted(payloads: impl IntoIterator<Item = Value>) -> Self {
        let model = ScriptedModel::new();
        for payload in payloads {
            model.push_payload(payload);
        }
        Self::new(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_errors() {
        let model = ScriptedModel::new();
        model.push_payload(json!({"summary": "one"}));
        model.push_result(Err(AgentError::model("rate limited")));

        assert_eq!(
            model.run("p1", &[]).await.unwrap(),
            json!({"final_output": {"summary": "one"}})
        );
        assert_eq!(model.run("p2", &[]).await, Err(AgentError::model("rate limited")));
        assert!(model.run("p3", &[]).await.is_err());
        assert_eq!(model.prompts(), vec!["p1", "p2", "p3"]);
        assert_eq!(model.remaining(), 0);
    }
}
