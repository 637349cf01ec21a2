pub mod analyst;
pub mod document_loader;
pub mod echo;
pub mod registry;

use crate::types::{AgentResult, AgentType, Result};
use async_trait::async_trait;
use serde_json::Value;

// Re-export commonly used types
pub use analyst::AnalystAgent;
pub use document_loader::DocumentLoaderAgent;
pub use echo::EchoAgent;
pub use registry::{AgentConstructor, AgentRegistry, ShutdownReport};

/// Base trait for all agents
///
/// The registry drives the lifecycle: `initialize` once before the first
/// `process`, `shutdown` once at the end. Expected failures (bad input,
/// missing records) come back as `AgentResult { success: false, .. }`;
/// `Err` is reserved for faults the agent did not anticipate.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Registry-unique identifier
    fn agent_id(&self) -> &str;

    /// Human readable name
    fn agent_name(&self) -> &str;

    /// The capability this agent provides
    fn agent_type(&self) -> AgentType;

    /// Prepare resources. Returns false on recoverable setup failure.
    async fn initialize(&self) -> bool;

    /// Process one input
    async fn process(&self, input: Value) -> Result<AgentResult>;

    /// Release resources. Not guaranteed to be idempotent.
    async fn shutdown(&self) -> bool;
}

/// Lifecycle an agent moves through while owned by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Uninitialized,
    Initialized,
    ShutDown,
}

/// Minimal input contract shared by all agents.
///
/// Returns the validation failure to hand back, or `None` when the input
/// is usable.
pub fn validate_input(input: &Value) -> Option<AgentResult> {
    let empty = match input {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    };

    if empty {
        Some(AgentResult::validation_error("input must not be null or empty"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Value::Null)]
    #[case(json!(""))]
    #[case(json!("   "))]
    #[case(json!([]))]
    #[case(json!({}))]
    fn test_rejects_empty_input(#[case] input: Value) {
        let result = validate_input(&input).expect("should reject");
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[rstest]
    #[case(json!("hi"))]
    #[case(json!(0))]
    #[case(json!(false))]
    #[case(json!(["doc-1"]))]
    #[case(json!({"document_id": "doc-1"}))]
    fn test_accepts_non_empty_input(#[case] input: Value) {
        assert!(validate_input(&input).is_none());
    }
}
