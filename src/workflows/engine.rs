//! Workflow Engine
//!
//! Walks a [`Workflow`] graph one node at a time. Each node is dispatched
//! (to an agent, or to the external graph engine), its result picks an
//! outcome label, and the label picks the next node. The previous node's
//! `data` is the next node's input.

use crate::agents::AgentRegistry;
use crate::types::{AgentResult, AppError, Result};
use crate::workflows::external::GraphEngine;
use crate::workflows::graph::Workflow;
use crate::workflows::node::{
    NodeKind, WorkflowNode, OUTCOME_FAILURE, OUTCOME_SUCCESS, TERMINAL_COMPLETE, TERMINAL_ERROR,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Default cap on node visits for a single execution
pub const DEFAULT_MAX_STEPS: usize = 64;

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Complete,
    Error,
}

/// A single step in the workflow execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// The node that executed this step
    pub node_id: String,
    /// The agent or graph the node dispatched to
    pub target: String,
    /// Outcome label derived from the node's result
    pub outcome: String,
    /// When this step started
    pub timestamp: DateTime<Utc>,
    /// Duration of this step in milliseconds
    pub duration_ms: u64,
}

/// Output from a workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub workflow_id: String,
    /// Identifier of this particular execution
    pub run_id: Uuid,
    pub status: WorkflowStatus,
    /// The result of the last node, normalized to the terminal status
    pub result: AgentResult,
    /// Every step taken, in order
    pub history: Vec<WorkflowStep>,
}

impl WorkflowOutput {
    /// Fold the execution details into the result's metrics
    pub fn into_agent_result(self) -> AgentResult {
        let steps = self.history.len();
        let history = serde_json::to_value(&self.history).unwrap_or_default();
        self.result
            .with_metric("workflow_id", json!(self.workflow_id))
            .with_metric("run_id", json!(self.run_id.to_string()))
            .with_metric("steps", json!(steps))
            .with_metric("history", history)
    }
}

/// Workflow engine that orchestrates agent execution
///
/// The engine holds no per-execution state, so one instance can drive any
/// number of concurrent runs of the same workflow.
pub struct WorkflowEngine {
    agents: Arc<AgentRegistry>,
    graphs: Option<Arc<dyn GraphEngine>>,
    max_steps: usize,
}

impl WorkflowEngine {
    /// Create a new workflow engine
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self {
            agents,
            graphs: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Attach the external graph engine used by subgraph nodes
    pub fn with_graph_engine(mut self, graphs: Arc<dyn GraphEngine>) -> Self {
        self.graphs = Some(graphs);
        self
    }

    /// Cap the number of node visits per execution
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn agent_registry(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    /// Execute a workflow from its start node
    ///
    /// # Returns
    ///
    /// A `WorkflowOutput` when the run reaches `complete` or `error`.
    /// Reaching an outcome with no declared edge is a `WorkflowStalled`
    /// error naming the node.
    pub async fn execute(&self, workflow: &Workflow, input: Value) -> Result<WorkflowOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "workflow_run",
            workflow_id = %workflow.workflow_id,
            run_id = %run_id
        );
        self.traverse(workflow, input, run_id).instrument(span).await
    }

    async fn traverse(
        &self,
        workflow: &Workflow,
        input: Value,
        run_id: Uuid,
    ) -> Result<WorkflowOutput> {
        let mut history: Vec<WorkflowStep> = Vec::new();
        let mut payload = input;
        let mut current_id = workflow.start_node_id.clone();

        tracing::info!(start = %current_id, "Workflow started");

        loop {
            if history.len() >= self.max_steps {
                tracing::error!(limit = self.max_steps, "Workflow exceeded step limit");
                return Err(AppError::StepLimitExceeded {
                    workflow_id: workflow.workflow_id.clone(),
                    limit: self.max_steps,
                });
            }

            let node = workflow.node(&current_id).ok_or_else(|| {
                AppError::InvalidWorkflow(format!(
                    "Workflow '{}' has no node '{}'",
                    workflow.workflow_id, current_id
                ))
            })?;

            let timestamp = Utc::now();
            let step_start = Instant::now();
            let result = self.run_node(node, payload).await?;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            let outcome = if result.success {
                OUTCOME_SUCCESS
            } else {
                OUTCOME_FAILURE
            };

            history.push(WorkflowStep {
                node_id: node.node_id.clone(),
                target: node.target.clone(),
                outcome: outcome.to_string(),
                timestamp,
                duration_ms,
            });

            tracing::debug!(node_id = %node.node_id, outcome, duration_ms, "Workflow step finished");

            let Some(next) = node.next_for(outcome) else {
                tracing::error!(
                    node_id = %node.node_id,
                    outcome,
                    "Workflow stalled: no transition declared for outcome"
                );
                return Err(AppError::WorkflowStalled {
                    workflow_id: workflow.workflow_id.clone(),
                    node_id: node.node_id.clone(),
                    label: outcome.to_string(),
                });
            };

            match next {
                TERMINAL_COMPLETE => {
                    tracing::info!(steps = history.len(), "Workflow complete");
                    return Ok(Self::finish(
                        workflow,
                        run_id,
                        WorkflowStatus::Complete,
                        result,
                        history,
                    ));
                }
                TERMINAL_ERROR => {
                    tracing::warn!(
                        node_id = %node.node_id,
                        steps = history.len(),
                        "Workflow terminated on error edge"
                    );
                    return Ok(Self::finish(
                        workflow,
                        run_id,
                        WorkflowStatus::Error,
                        result,
                        history,
                    ));
                }
                next_id => {
                    payload = result.payload();
                    current_id = next_id.to_string();
                }
            }
        }
    }

    async fn run_node(&self, node: &WorkflowNode, payload: Value) -> Result<AgentResult> {
        match node.node_kind {
            NodeKind::Agent => self.agents.dispatch_target(&node.target, payload).await,
            NodeKind::Subgraph => {
                let graphs = self.graphs.as_ref().ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Node '{}' delegates to graph '{}' but no graph engine is configured",
                        node.node_id, node.target
                    ))
                })?;

                if !graphs.has_graph(&node.target) {
                    return Err(AppError::NotFound(format!("Graph '{}' not found", node.target)));
                }

                match graphs.run_graph(&node.target, payload).await {
                    Ok(graph_result) => Ok(graph_result.into_agent_result(&node.target)),
                    Err(e) => {
                        tracing::error!(
                            node_id = %node.node_id,
                            graph = %node.target,
                            error = %e,
                            "External graph raised an error"
                        );
                        Err(e)
                    }
                }
            }
        }
    }

    /// Normalize the final result so it agrees with the terminal reached
    fn finish(
        workflow: &Workflow,
        run_id: Uuid,
        status: WorkflowStatus,
        mut result: AgentResult,
        history: Vec<WorkflowStep>,
    ) -> WorkflowOutput {
        match status {
            WorkflowStatus::Complete => {
                result.success = true;
                result.error = None;
            }
            WorkflowStatus::Error => {
                result.success = false;
                result.data = None;
                if result.error.is_none() {
                    let last = history.last().map(|s| s.node_id.as_str()).unwrap_or("");
                    result.error = Some(format!(
                        "Workflow '{}' routed to error at node '{}'",
                        workflow.workflow_id, last
                    ));
                }
            }
        }

        WorkflowOutput {
            workflow_id: workflow.workflow_id.clone(),
            run_id,
            status,
            result,
            history,
        }
    }
}
