use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Outcome label chosen when a step succeeds
pub const OUTCOME_SUCCESS: &str = "success";
/// Outcome label chosen when a step fails
pub const OUTCOME_FAILURE: &str = "failure";
/// Transition key accepted as an alias for `failure`
pub const OUTCOME_ERROR_ALIAS: &str = "error";

/// Reserved transition target: finish successfully
pub const TERMINAL_COMPLETE: &str = "complete";
/// Reserved transition target: finish with failure
pub const TERMINAL_ERROR: &str = "error";

/// Whether a transition target is one of the reserved terminals
pub fn is_terminal(target: &str) -> bool {
    target == TERMINAL_COMPLETE || target == TERMINAL_ERROR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Dispatch to an agent through the agent registry
    #[default]
    Agent,
    /// Delegate to a named graph on the external graph engine
    Subgraph,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Agent => f.write_str("agent"),
            NodeKind::Subgraph => f.write_str("subgraph"),
        }
    }
}

/// One step in a workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub node_id: String,
    #[serde(default)]
    pub node_kind: NodeKind,
    /// Agent id or type for agent nodes, graph name for subgraph nodes
    pub target: String,
    /// Outcome label -> next node id or reserved terminal
    #[serde(default)]
    pub transitions: HashMap<String, String>,
}

impl WorkflowNode {
    pub fn agent(node_id: &str, target: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            node_kind: NodeKind::Agent,
            target: target.to_string(),
            transitions: HashMap::new(),
        }
    }

    pub fn subgraph(node_id: &str, graph_name: &str) -> Self {
        Self {
            node_kind: NodeKind::Subgraph,
            ..Self::agent(node_id, graph_name)
        }
    }

    /// Add an outcome edge
    pub fn on(mut self, label: &str, next: &str) -> Self {
        self.transitions.insert(label.to_string(), next.to_string());
        self
    }

    pub fn on_success(self, next: &str) -> Self {
        self.on(OUTCOME_SUCCESS, next)
    }

    pub fn on_failure(self, next: &str) -> Self {
        self.on(OUTCOME_FAILURE, next)
    }

    /// Next node for an outcome label
    ///
    /// A `failure` outcome also follows an edge declared under `error`.
    pub fn next_for(&self, label: &str) -> Option<&str> {
        self.transitions
            .get(label)
            .or_else(|| {
                if label == OUTCOME_FAILURE {
                    self.transitions.get(OUTCOME_ERROR_ALIAS)
                } else {
                    None
                }
            })
            .map(String::as_str)
    }
}
