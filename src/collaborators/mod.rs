//! Collaborator interfaces consumed by agent implementations
//!
//! The orchestration core never talks to storage or an LLM directly. Agents
//! that need either receive one of these traits at construction time.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============= Persistence =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            metadata: HashMap::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Document lookup and mutation. Implementations must be safe to retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Insert or replace a document
    async fn put_document(&self, document: Document) -> Result<()>;
}

/// Process-local document store, used by the CLI and tests
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        {
            let mut map = store.documents.write();
            for doc in documents {
                map.insert(doc.id.clone(), doc);
            }
        }
        store
    }

    /// Load a JSON array of documents
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read documents from {:?}: {}", path, e))
        })?;
        let documents: Vec<Document> = serde_json::from_str(&content).map_err(|e| {
            AppError::Configuration(format!("Invalid documents file {:?}: {}", path, e))
        })?;
        Ok(Self::with_documents(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().get(id).cloned())
    }

    async fn put_document(&self, mut document: Document) -> Result<()> {
        if document.id.trim().is_empty() {
            return Err(AppError::InvalidInput("document id must not be empty".into()));
        }
        document.updated_at = Utc::now();
        self.documents.write().insert(document.id.clone(), document);
        Ok(())
    }
}

// ============= LLM =============

/// Generation parameters passed through to the completion backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Opaque request/response LLM capability
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, config: &CompletionConfig) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryDocumentStore::new();
        store
            .put_document(Document::new("doc-1", "Title", "Body"))
            .await
            .unwrap();

        let doc = store.get_document("doc-1").await.unwrap().unwrap();
        assert_eq!(doc.title, "Title");
        assert!(store.get_document("doc-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        let doc = Document::new("doc-1", "Title", "Body");
        store.put_document(doc.clone()).await.unwrap();
        store.put_document(doc).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[{"id": "doc-1", "title": "Notes", "content": "text"}]"#,
        )
        .unwrap();

        let store = InMemoryDocumentStore::from_json_file(file.path()).unwrap();
        let doc = store.get_document("doc-1").await.unwrap().unwrap();
        assert_eq!(doc.title, "Notes");
        assert!(doc.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_put_rejects_blank_id() {
        let store = InMemoryDocumentStore::new();
        let result = store.put_document(Document::new(" ", "t", "c")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
