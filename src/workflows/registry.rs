use crate::types::{AgentResult, AppError, Result};
use crate::workflows::engine::{WorkflowEngine, WorkflowOutput};
use crate::workflows::graph::Workflow;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Summary row for `WorkflowRegistry::list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub display_name: String,
    pub start_node_id: String,
    pub node_count: usize,
}

/// Named collection of workflows, run through a shared engine
pub struct WorkflowRegistry {
    workflows: RwLock<HashMap<String, Arc<Workflow>>>,
    engine: WorkflowEngine,
}

impl WorkflowRegistry {
    pub fn new(engine: WorkflowEngine) -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            engine,
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Register a workflow. Fails if the id is taken.
    pub fn register(&self, workflow: Workflow) -> Result<()> {
        workflow.validate()?;

        let mut workflows = self.workflows.write();
        if workflows.contains_key(&workflow.workflow_id) {
            return Err(AppError::DuplicateId(format!(
                "Workflow '{}' is already registered",
                workflow.workflow_id
            )));
        }

        tracing::info!(
            workflow_id = %workflow.workflow_id,
            nodes = workflow.nodes.len(),
            "Workflow registered"
        );
        workflows.insert(workflow.workflow_id.clone(), Arc::new(workflow));
        Ok(())
    }

    pub fn get(&self, workflow_id: &str) -> Option<Arc<Workflow>> {
        self.workflows.read().get(workflow_id).cloned()
    }

    pub fn contains(&self, workflow_id: &str) -> bool {
        self.workflows.read().contains_key(workflow_id)
    }

    /// Registered workflows, ordered by id
    pub fn list(&self) -> Vec<WorkflowSummary> {
        let mut summaries: Vec<WorkflowSummary> = self
            .workflows
            .read()
            .values()
            .map(|w| WorkflowSummary {
                workflow_id: w.workflow_id.clone(),
                display_name: w.display_name.clone(),
                start_node_id: w.start_node_id.clone(),
                node_count: w.nodes.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
        summaries
    }

    /// Run a workflow and return its final result with the history folded
    /// into the metrics
    pub async fn run(&self, workflow_id: &str, initial_input: Value) -> Result<AgentResult> {
        Ok(self
            .run_detailed(workflow_id, initial_input)
            .await?
            .into_agent_result())
    }

    /// Run a workflow and return the full execution record
    pub async fn run_detailed(
        &self,
        workflow_id: &str,
        initial_input: Value,
    ) -> Result<WorkflowOutput> {
        // clone the Arc so the lock is not held across the run
        let workflow = self
            .get(workflow_id)
            .ok_or_else(|| AppError::NotFound(format!("Workflow '{}' not found", workflow_id)))?;
        self.engine.execute(&workflow, initial_input).await
    }
}
