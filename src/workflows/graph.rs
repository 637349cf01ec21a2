//! Workflow definitions
//!
//! A [`Workflow`] is an immutable directed graph of [`WorkflowNode`]s. It is
//! built once, validated, and then shared read-only between any number of
//! concurrent executions.

use crate::types::{AppError, Result};
use crate::utils::toml_config::WorkflowConfig;
use crate::workflows::node::{is_terminal, WorkflowNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: String,
    pub display_name: String,
    pub nodes: HashMap<String, WorkflowNode>,
    pub start_node_id: String,
}

impl Workflow {
    /// Start building a workflow
    pub fn builder(workflow_id: &str) -> WorkflowBuilder {
        WorkflowBuilder::new(workflow_id)
    }

    /// Build a workflow from its `[workflows.<id>]` configuration table
    pub fn from_config(workflow_id: &str, config: &WorkflowConfig) -> Result<Self> {
        let mut builder = Workflow::builder(workflow_id).start(&config.start);
        if let Some(ref name) = config.display_name {
            builder = builder.display_name(name);
        }

        let mut node_ids: Vec<&String> = config.nodes.keys().collect();
        node_ids.sort();
        for node_id in node_ids {
            let node = &config.nodes[node_id];
            builder = builder.node(WorkflowNode {
                node_id: node_id.clone(),
                node_kind: node.kind,
                target: node.target.clone(),
                transitions: node.transitions.clone(),
            });
        }

        builder.build()
    }

    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.nodes.get(node_id)
    }

    pub fn start_node(&self) -> Option<&WorkflowNode> {
        self.nodes.get(&self.start_node_id)
    }

    /// Check the structural invariants
    ///
    /// The start node must exist, and every transition must lead to a
    /// declared node or a reserved terminal. Outcome labels themselves are
    /// not checked here; an undeclared label surfaces as a stall at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.workflow_id.trim().is_empty() {
            return Err(AppError::InvalidWorkflow("workflow id must not be empty".into()));
        }

        if !self.nodes.contains_key(&self.start_node_id) {
            return Err(AppError::InvalidWorkflow(format!(
                "Workflow '{}' start node '{}' is not declared",
                self.workflow_id, self.start_node_id
            )));
        }

        for (key, node) in &self.nodes {
            if key != &node.node_id {
                return Err(AppError::InvalidWorkflow(format!(
                    "Workflow '{}' has node '{}' stored under key '{}'",
                    self.workflow_id, node.node_id, key
                )));
            }
            if is_terminal(&node.node_id) {
                return Err(AppError::InvalidWorkflow(format!(
                    "Workflow '{}' uses reserved name '{}' as a node id",
                    self.workflow_id, node.node_id
                )));
            }
            if node.target.trim().is_empty() {
                return Err(AppError::InvalidWorkflow(format!(
                    "Workflow '{}' node '{}' has no target",
                    self.workflow_id, node.node_id
                )));
            }
            for (label, next) in &node.transitions {
                if !is_terminal(next) && !self.nodes.contains_key(next) {
                    return Err(AppError::InvalidWorkflow(format!(
                        "Workflow '{}' node '{}' routes '{}' to undeclared node '{}'",
                        self.workflow_id, node.node_id, label, next
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Fluent builder for [`Workflow`]
pub struct WorkflowBuilder {
    workflow_id: String,
    display_name: Option<String>,
    start_node_id: Option<String>,
    nodes: Vec<WorkflowNode>,
}

impl WorkflowBuilder {
    pub fn new(workflow_id: &str) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            display_name: None,
            start_node_id: None,
            nodes: Vec::new(),
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn start(mut self, node_id: &str) -> Self {
        self.start_node_id = Some(node_id.to_string());
        self
    }

    /// Add a node. The first node added is the start node unless `start`
    /// is called.
    pub fn node(mut self, node: WorkflowNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Validate and freeze the workflow
    pub fn build(self) -> Result<Workflow> {
        let start_node_id = self
            .start_node_id
            .or_else(|| self.nodes.first().map(|n| n.node_id.clone()))
            .ok_or_else(|| {
                AppError::InvalidWorkflow(format!("Workflow '{}' has no nodes", self.workflow_id))
            })?;

        let mut nodes = HashMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            if nodes.contains_key(&node.node_id) {
                return Err(AppError::InvalidWorkflow(format!(
                    "Workflow '{}' declares node '{}' twice",
                    self.workflow_id, node.node_id
                )));
            }
            nodes.insert(node.node_id.clone(), node);
        }

        let workflow = Workflow {
            display_name: self
                .display_name
                .unwrap_or_else(|| self.workflow_id.clone()),
            workflow_id: self.workflow_id,
            nodes,
            start_node_id,
        };
        workflow.validate()?;
        Ok(workflow)
    }
}
