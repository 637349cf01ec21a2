//! Document loader agent
//!
//! Resolves a document id against the persistence collaborator and hands
//! the stored document to the next workflow step.
//!
//! Accepted inputs:
//! - a bare id: `"doc-1"`
//! - an object: `{"document_id": "doc-1"}`

use crate::{
    agents::{validate_input, Agent, AgentState},
    collaborators::DocumentStore,
    types::{AgentResult, AgentSpec, AgentType, AppError, Result},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

pub struct DocumentLoaderAgent {
    id: String,
    name: String,
    store: Arc<dyn DocumentStore>,
    /// Reject documents whose content is blank
    require_content: bool,
    state: Mutex<AgentState>,
}

impl DocumentLoaderAgent {
    pub fn new(id: &str, name: &str, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            store,
            require_content: false,
            state: Mutex::new(AgentState::Uninitialized),
        }
    }

    /// Build from a registry spec. Reads the optional `require_content` flag.
    pub fn from_spec(spec: AgentSpec, store: Arc<dyn DocumentStore>) -> Self {
        let mut agent = Self::new(&spec.agent_id, &spec.agent_name, store);
        agent.require_content = spec
            .config
            .get("require_content")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        agent
    }

    fn document_id(input: &Value) -> Option<&str> {
        let id = match input {
            Value::String(id) => Some(id.trim()),
            Value::Object(map) => map
                .get("document_id")
                .and_then(Value::as_str)
                .map(str::trim),
            _ => None,
        };
        id.filter(|id| !id.is_empty())
    }
}

#[async_trait]
impl Agent for DocumentLoaderAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn agent_name(&self) -> &str {
        &self.name
    }

    fn agent_type(&self) -> AgentType {
        AgentType::DocumentLoader
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

        let Some(document_id) = Self::document_id(&input) else {
            return Ok(AgentResult::validation_error(
                "expected a document id or {\"document_id\": ...}",
            ));
        };

        let started = Instant::now();
        let document = self.store.get_document(document_id).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match document {
            Some(doc) if self.require_content && doc.content.trim().is_empty() => Ok(
                AgentResult::failure(format!("Document '{}' has no content", document_id)),
            ),
            Some(doc) => {
                let data = serde_json::to_value(&doc)
                    .map_err(|e| AppError::Internal(format!("Failed to encode document: {}", e)))?;
                Ok(AgentResult::success(data, format!("Loaded document '{}'", document_id))
                    .with_metric("lookup_ms", json!(elapsed_ms)))
            }
            None => Ok(AgentResult::failure(format!(
                "Document '{}' not found",
                document_id
            ))),
        }
    }

    async fn shutdown(&self) -> bool {
        *self.state.lock() = AgentState::ShutDown;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Document, InMemoryDocumentStore};
    use std::collections::HashMap;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::with_documents([
            Document::new("doc-1", "Report", "quarterly numbers"),
            Document::new("empty", "Blank", "  "),
        ]))
    }

    async fn ready(agent: DocumentLoaderAgent) -> DocumentLoaderAgent {
        assert!(agent.initialize().await);
        agent
    }

    #[tokio::test]
    async fn test_loads_by_bare_id() {
        let agent = ready(DocumentLoaderAgent::new("loader", "Loader", store())).await;
        let result = agent.process(json!("doc-1")).await.unwrap();

        assert!(result.success);
        assert_eq!(result.data.unwrap()["title"], "Report");
        assert!(result.metrics.unwrap().contains_key("lookup_ms"));
    }

    #[tokio::test]
    async fn test_loads_by_object() {
        let agent = ready(DocumentLoaderAgent::new("loader", "Loader", store())).await;
        let result = agent
            .process(json!({"document_id": "doc-1"}))
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_missing_document_is_a_failure_result() {
        let agent = ready(DocumentLoaderAgent::new("loader", "Loader", store())).await;
        let result = agent.process(json!("nope")).await.unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_a_validation_failure() {
        let agent = ready(DocumentLoaderAgent::new("loader", "Loader", store())).await;
        let result = agent.process(json!({"id": 3})).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_require_content_flag() {
        let mut config = HashMap::new();
        config.insert("require_content".to_string(), json!(true));
        let spec = AgentSpec {
            agent_id: "loader".into(),
            agent_name: "Loader".into(),
            agent_type: AgentType::DocumentLoader,
            config,
        };
        let agent = ready(DocumentLoaderAgent::from_spec(spec, store())).await;

        let result = agent.process(json!("empty")).await.unwrap();
        assert!(!result.success);
    }
}
