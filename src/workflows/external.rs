//! External graph engine boundary
//!
//! Subgraph nodes hand their payload to a richer graph engine (branching,
//! cycles, checkpoints) that lives outside this crate. Whatever it returns
//! is projected back onto the `success` / `failure` outcome labels.

use crate::types::{AgentResult, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result mapping returned by an external graph run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Any further keys the engine reported
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphResult {
    /// Interpret an arbitrary mapping
    ///
    /// An explicit boolean `success` key wins. Otherwise the value's
    /// truthiness decides: null, false, zero, and empty strings or
    /// collections count as failure.
    pub fn from_value(value: Value) -> Self {
        if let Value::Object(ref map) = value {
            if let Some(Value::Bool(success)) = map.get("success") {
                let success = *success;
                let mut map = map.clone();
                map.remove("success");
                let data = map.remove("data");
                let error = map
                    .remove("error")
                    .and_then(|e| e.as_str().map(str::to_string));
                return Self {
                    success,
                    data,
                    error,
                    extra: map,
                };
            }
        }

        let success = truthy(&value);
        Self {
            success,
            data: Some(value),
            error: None,
            extra: Map::new(),
        }
    }

    /// Project onto the common result envelope
    pub fn into_agent_result(self, graph_name: &str) -> AgentResult {
        let mut result = if self.success {
            AgentResult::success(
                self.data.unwrap_or(Value::Null),
                format!("Graph '{}' completed", graph_name),
            )
        } else {
            AgentResult::failure(
                self.error
                    .unwrap_or_else(|| format!("Graph '{}' reported failure", graph_name)),
            )
        };
        if !self.extra.is_empty() {
            result.metrics = Some(self.extra);
        }
        result
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// An engine able to run named graphs
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Run a named graph with the given payload
    async fn run_graph(&self, graph_name: &str, payload: Value) -> Result<GraphResult>;

    /// Whether the engine knows a graph by this name
    fn has_graph(&self, graph_name: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_explicit_success_key() {
        let result = GraphResult::from_value(json!({
            "success": true,
            "data": {"entities": 3},
            "iterations": 2
        }));
        assert!(result.success);
        assert_eq!(result.data, Some(json!({"entities": 3})));
        assert_eq!(result.extra["iterations"], json!(2));
    }

    #[test]
    fn test_explicit_failure_keeps_error() {
        let result = GraphResult::from_value(json!({"success": false, "error": "timeout"}));
        let agent_result = result.into_agent_result("g");
        assert!(!agent_result.success);
        assert_eq!(agent_result.error.as_deref(), Some("timeout"));
    }

    #[rstest]
    #[case(json!(null), false)]
    #[case(json!(false), false)]
    #[case(json!(0), false)]
    #[case(json!(""), false)]
    #[case(json!({}), false)]
    #[case(json!("done"), true)]
    #[case(json!([1]), true)]
    #[case(json!({"summary": "x"}), true)]
    fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(GraphResult::from_value(value).success, expected);
    }

    #[test]
    fn test_into_agent_result_carries_extra_as_metrics() {
        let result = GraphResult::from_value(json!({"success": true, "data": 1, "nodes_run": 4}))
            .into_agent_result("g");
        assert!(result.success);
        assert_eq!(result.metrics.unwrap()["nodes_run"], json!(4));
    }
}
