//! Workflow Engine Module
//!
//! Workflows are directed graphs of agent invocations connected by
//! outcome-labelled edges. Every node declares where a `success` or
//! `failure` outcome goes next: another node, or one of the reserved
//! terminals `complete` and `error`.
//!
//! # Configuration
//!
//! Workflows can be declared in `synapse.toml`:
//!
//! ```toml
//! [workflows.pipeline]
//! display_name = "Document pipeline"
//! start = "analyze"
//!
//! [workflows.pipeline.nodes.analyze]
//! kind = "agent"
//! target = "analyst"
//! transitions = { success = "extract", failure = "error" }
//!
//! [workflows.pipeline.nodes.extract]
//! kind = "subgraph"
//! target = "entity_graph"
//! transitions = { success = "complete", failure = "error" }
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let engine = WorkflowEngine::new(agent_registry);
//! let workflows = WorkflowRegistry::new(engine);
//! workflows.register(workflow)?;
//! let result = workflows.run("pipeline", json!("doc-1")).await?;
//! println!("Steps: {}", result.metrics.unwrap()["steps"]);
//! ```

pub mod engine;
pub mod external;
pub mod graph;
pub mod node;
pub mod registry;

pub use engine::{WorkflowEngine, WorkflowOutput, WorkflowStatus, WorkflowStep};
pub use external::{GraphEngine, GraphResult};
pub use graph::{Workflow, WorkflowBuilder};
pub use node::{NodeKind, WorkflowNode, TERMINAL_COMPLETE, TERMINAL_ERROR};
pub use registry::{WorkflowRegistry, WorkflowSummary};
