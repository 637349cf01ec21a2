//! # Synapse - agent orchestration core
//!
//! The orchestration layer of a knowledge-extraction backend: it owns the
//! live agents, sequences them through outcome-labelled workflow graphs,
//! and fans batches of documents out to them with bounded parallelism.
//!
//! ## Overview
//!
//! Synapse can be used in two ways:
//!
//! 1. **As a CLI** - Run the `synapse` binary against a `synapse.toml`
//! 2. **As a library** - Embed the registries behind your own transport
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use synapse::{AgentRegistry, AgentType, EchoAgent, WorkflowEngine, WorkflowRegistry};
//! use synapse::workflows::{Workflow, WorkflowNode, TERMINAL_COMPLETE};
//! use std::{collections::HashMap, sync::Arc};
//!
//! let agents = Arc::new(AgentRegistry::new());
//! agents.register_type(AgentType::Echo, |spec| Box::new(EchoAgent::from_spec(spec)))?;
//! agents.create("e1", "Echo", "echo", HashMap::new()).await?;
//!
//! let workflows = WorkflowRegistry::new(WorkflowEngine::new(Arc::clone(&agents)));
//! workflows.register(
//!     Workflow::builder("hello")
//!         .node(WorkflowNode::agent("only", "e1").on_success(TERMINAL_COMPLETE))
//!         .build()?,
//! )?;
//!
//! let result = workflows.run("hello", serde_json::json!("hi")).await?;
//! assert!(result.success);
//! ```
//!
//! ### Configuration-Driven Setup
//!
//! ```rust,ignore
//! use synapse::{ConfigManager, Runtime, InMemoryDocumentStore};
//! use std::sync::Arc;
//!
//! let config_manager = ConfigManager::new("synapse.toml")?;
//! let runtime = Runtime::from_config(
//!     &config_manager.config(),
//!     Arc::new(InMemoryDocumentStore::new()),
//! )
//! .await?;
//!
//! let report = runtime
//!     .dispatcher
//!     .run_agent(Arc::clone(&runtime.agents), "loader", vec!["doc-1".into()])
//!     .await?;
//! println!("{} failed", report.failed());
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Agent contract, registry and built-in agents
//! - [`workflows`] - Workflow graphs, traversal engine and registry
//! - [`dispatch`] - Bounded-concurrency batch dispatcher
//! - [`collaborators`] - Storage and LLM interfaces consumed by agents
//! - [`types`] - Common types and error handling

#![warn(rustdoc::missing_crate_level_docs)]

/// Agent contract, lifecycle and registry.
pub mod agents;
/// Composition root building registries from configuration.
pub mod bootstrap;
/// Command-line parsing and terminal output.
pub mod cli;
/// Storage and LLM collaborator interfaces.
pub mod collaborators;
/// Batch dispatch with a concurrency cap.
pub mod dispatch;
/// Core types (results, agent types, errors).
pub mod types;
/// Configuration and logging utilities.
pub mod utils;
/// Workflow engine for agent orchestration.
pub mod workflows;

// Re-export commonly used types
pub use agents::{
    Agent, AgentRegistry, AnalystAgent, DocumentLoaderAgent, EchoAgent, ShutdownReport,
};
pub use bootstrap::{Collaborators, Runtime};
pub use collaborators::{CompletionClient, CompletionConfig, DocumentStore, InMemoryDocumentStore};
pub use dispatch::{BatchDispatcher, BatchOutcome, BatchReport, BatchStatus};
pub use types::{AgentResult, AgentType, AppError, Result};
pub use utils::toml_config::{ConfigManager, SynapseConfig};
pub use workflows::{
    GraphEngine, Workflow, WorkflowEngine, WorkflowNode, WorkflowOutput, WorkflowRegistry,
    WorkflowStep,
};
