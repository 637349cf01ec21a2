//! Composition root
//!
//! Builds the agent registry, workflow registry, and batch dispatcher from a
//! [`SynapseConfig`]. Agents are created in id order so startup logs and
//! failures are deterministic.

use crate::agents::{AgentRegistry, AnalystAgent, DocumentLoaderAgent, EchoAgent, ShutdownReport};
use crate::collaborators::{CompletionClient, DocumentStore};
use crate::dispatch::BatchDispatcher;
use crate::types::{AgentType, Result};
use crate::utils::toml_config::SynapseConfig;
use crate::workflows::{GraphEngine, Workflow, WorkflowEngine, WorkflowRegistry};
use std::sync::Arc;

/// External capabilities handed to agents and the workflow engine
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn DocumentStore>,
    /// Enables the `analyst` agent type
    pub completion: Option<Arc<dyn CompletionClient>>,
    /// Enables subgraph workflow nodes
    pub graphs: Option<Arc<dyn GraphEngine>>,
}

impl Collaborators {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            completion: None,
            graphs: None,
        }
    }

    pub fn with_completion(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    pub fn with_graphs(mut self, graphs: Arc<dyn GraphEngine>) -> Self {
        self.graphs = Some(graphs);
        self
    }
}

/// Everything a caller needs to serve agent, workflow and batch requests
pub struct Runtime {
    pub agents: Arc<AgentRegistry>,
    pub workflows: Arc<WorkflowRegistry>,
    pub dispatcher: BatchDispatcher,
}

impl Runtime {
    /// Build a runtime backed only by a document store
    pub async fn from_config(config: &SynapseConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        Self::build(config, Collaborators::new(store)).await
    }

    /// Build a runtime with every collaborator the caller supplies
    pub async fn build(config: &SynapseConfig, collaborators: Collaborators) -> Result<Self> {
        let agents = Arc::new(AgentRegistry::new());
        register_builtin_types(&agents, collaborators.store)?;
        if let Some(client) = collaborators.completion {
            register_analyst_type(&agents, client)?;
        }

        for agent_id in config.agent_ids() {
            let Some(agent_config) = config.get_agent(agent_id) else {
                continue;
            };
            let name = agent_config.name.as_deref().unwrap_or(agent_id);
            agents
                .create(agent_id, name, &agent_config.agent_type, agent_config.config.clone())
                .await?;
        }

        let mut engine =
            WorkflowEngine::new(Arc::clone(&agents)).with_max_steps(config.engine.max_steps);
        if let Some(graphs) = collaborators.graphs {
            engine = engine.with_graph_engine(graphs);
        }

        let workflows = Arc::new(WorkflowRegistry::new(engine));
        for workflow_id in config.workflow_ids() {
            let Some(workflow_config) = config.get_workflow(workflow_id) else {
                continue;
            };
            workflows.register(Workflow::from_config(workflow_id, workflow_config)?)?;
        }

        let dispatcher = BatchDispatcher::new(config.dispatch.max_concurrent)?;

        tracing::info!(
            agents = agents.len(),
            workflows = workflows.list().len(),
            max_concurrent = dispatcher.max_concurrent(),
            "Runtime ready"
        );

        Ok(Self {
            agents,
            workflows,
            dispatcher,
        })
    }

    /// Shut down every live agent
    pub async fn shutdown(&self) -> ShutdownReport {
        let report = self.agents.shutdown_all().await;
        if !report.is_clean() {
            tracing::warn!(failed = ?report.failed, "Some agents did not shut down cleanly");
        }
        report
    }
}

/// Register the agent types this crate ships with
pub fn register_builtin_types(
    registry: &AgentRegistry,
    store: Arc<dyn DocumentStore>,
) -> Result<()> {
    registry.register_type(AgentType::Echo, |spec| Box::new(EchoAgent::from_spec(spec)))?;
    registry.register_type(AgentType::DocumentLoader, move |spec| {
        Box::new(DocumentLoaderAgent::from_spec(spec, Arc::clone(&store)))
    })?;
    Ok(())
}

/// Register the LLM-backed `analyst` type
pub fn register_analyst_type(
    registry: &AgentRegistry,
    client: Arc<dyn CompletionClient>,
) -> Result<()> {
    registry.register_type(AgentType::Analyst, move |spec| {
        Box::new(AnalystAgent::from_spec(spec, Arc::clone(&client)))
    })
}
