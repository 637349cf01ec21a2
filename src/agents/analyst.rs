//! LLM-backed analyst agent
//!
//! Sends the input (or the `content` of a loaded document) to the
//! completion collaborator under a system prompt and returns the text.

use crate::{
    agents::{validate_input, Agent, AgentState},
    collaborators::{CompletionClient, CompletionConfig},
    types::{AgentResult, AgentSpec, AgentType, AppError, Result},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an Analyst Agent in a knowledge-extraction pipeline.

Read the text below and reply with:
- a two sentence summary
- the key entities it mentions, one per line

Be concise and do not invent facts that are not in the text."#;

pub struct AnalystAgent {
    id: String,
    name: String,
    client: Arc<dyn CompletionClient>,
    completion: CompletionConfig,
    system_prompt: String,
    state: Mutex<AgentState>,
}

impl AnalystAgent {
    pub fn new(id: &str, name: &str, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            client,
            completion: CompletionConfig::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            state: Mutex::new(AgentState::Uninitialized),
        }
    }

    /// Build from a registry spec.
    ///
    /// Recognised config keys: `model`, `temperature`, `max_tokens`,
    /// `system_prompt`.
    pub fn from_spec(spec: AgentSpec, client: Arc<dyn CompletionClient>) -> Self {
        let mut agent = Self::new(&spec.agent_id, &spec.agent_name, client);
        let config = &spec.config;

        if let Some(model) = config.get("model").and_then(Value::as_str) {
            agent.completion.model = model.to_string();
        }
        if let Some(temperature) = config.get("temperature").and_then(Value::as_f64) {
            agent.completion.temperature = temperature as f32;
        }
        if let Some(max_tokens) = config.get("max_tokens").and_then(Value::as_u64) {
            agent.completion.max_tokens = max_tokens as u32;
        }
        if let Some(prompt) = config.get("system_prompt").and_then(Value::as_str) {
            agent.system_prompt = prompt.to_string();
        }
        agent
    }

    fn source_text(input: &Value) -> String {
        match input {
            Value::String(text) => text.clone(),
            Value::Object(map) => match map.get("content").and_then(Value::as_str) {
                Some(content) => content.to_string(),
                None => input.to_string(),
            },
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl Agent for AnalystAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn agent_name(&self) -> &str {
        &self.name
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Analyst
    }

    async fn initialize(&self) -> bool {
        *self.state.lock() = AgentState::Initialized;
        true
    }

    async fn process(&self, input: Value) -> Result<AgentResult> {
        let state = *self.state.lock();
        if state != AgentState::Initialized {
            return Err(AppError::Agent {
                agent_id: self.id.clone(),
                message: format!("process called in state {:?}", state),
            });
        }

        if let Some(invalid) = validate_input(&input) {
            return Ok(invalid);
        }

        let prompt = format!("{}\n\n{}", self.system_prompt, Self::source_text(&input));

        let started = Instant::now();
        let completion = self.client.complete(&prompt, &self.completion).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if completion.trim().is_empty() {
            return Ok(AgentResult::failure("Model returned an empty completion"));
        }

        Ok(AgentResult::success(
            json!({ "analysis": completion.trim(), "model": self.completion.model }),
            "Analysis complete",
        )
        .with_metric("completion_ms", json!(elapsed_ms)))
    }

    async fn shutdown(&self) -> bool {
        *self.state.lock() = AgentState::ShutDown;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Returns the last line of the prompt, upper-cased
    struct ShoutingClient;

    #[async_trait]
    impl CompletionClient for ShoutingClient {
        async fn complete(&self, prompt: &str, config: &CompletionConfig) -> Result<String> {
            assert_eq!(config.model, "tiny");
            Ok(prompt.lines().last().unwrap_or("").to_uppercase())
        }
    }

    struct SilentClient;

    #[async_trait]
    impl CompletionClient for SilentClient {
        async fn complete(&self, _prompt: &str, _config: &CompletionConfig) -> Result<String> {
            Ok("   ".to_string())
        }
    }

    async fn analyst(client: Arc<dyn CompletionClient>) -> AnalystAgent {
        let mut config = HashMap::new();
        config.insert("model".to_string(), json!("tiny"));
        config.insert("temperature".to_string(), json!(0.0));
        let agent = AnalystAgent::from_spec(
            AgentSpec {
                agent_id: "a1".to_string(),
                agent_name: "Analyst".to_string(),
                agent_type: AgentType::Analyst,
                config,
            },
            client,
        );
        assert!(agent.initialize().await);
        agent
    }

    #[tokio::test]
    async fn test_uses_document_content() {
        let agent = analyst(Arc::new(ShoutingClient)).await;
        let result = agent
            .process(json!({"id": "doc-1", "content": "quarterly numbers"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["analysis"], json!("QUARTERLY NUMBERS"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_failure() {
        let agent = analyst(Arc::new(SilentClient)).await;
        let result = agent.process(json!("text")).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_rejects_empty_input() {
        let agent = analyst(Arc::new(SilentClient)).await;
        let result = agent.process(json!("")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Input validation failed");
    }
}
