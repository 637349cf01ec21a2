//! TOML-based configuration for Synapse
//!
//! This module provides declarative configuration for logging, the batch
//! dispatcher, the workflow engine, agents, and workflows via a TOML file
//! (`synapse.toml`).
//!
//! # Reloading
//!
//! Use `ConfigManager` for thread-safe access to the current configuration.
//! `reload()` swaps in a freshly validated file; readers never block.

use crate::types::AgentType;
use crate::workflows::graph::Workflow;
use crate::workflows::node::NodeKind;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "synapse.toml";

/// Root configuration structure loaded from synapse.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynapseConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Agent instances created at startup, keyed by agent id
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    /// Workflow definitions, keyed by workflow id
    #[serde(default)]
    pub workflows: HashMap<String, WorkflowConfig>,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: text, json
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ============= Dispatch Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum batch items in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    crate::dispatch::DEFAULT_MAX_CONCURRENT
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

// ============= Engine Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum node visits per workflow execution
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    crate::workflows::engine::DEFAULT_MAX_STEPS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent type tag or registered default name
    #[serde(rename = "type")]
    pub agent_type: String,

    /// Display name; falls back to the agent id
    #[serde(default)]
    pub name: Option<String>,

    /// Type-specific settings handed to the constructor
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

// ============= Workflow Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub display_name: Option<String>,

    /// Id of the first node to execute
    pub start: String,

    #[serde(default)]
    pub nodes: HashMap<String, NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub kind: NodeKind,

    /// Agent id or type for agent nodes; graph name for subgraph nodes
    pub target: String,

    /// Outcome label -> next node id or terminal
    #[serde(default)]
    pub transitions: HashMap<String, String>,
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Agent '{0}' referenced by workflow '{1}' does not exist")]
    MissingAgent(String, String),
}

impl SynapseConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: SynapseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.max_concurrent == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.engine.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_steps must be at least 1".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }

        for (agent_id, agent) in &self.agents {
            if agent.agent_type.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Agent '{}' has an empty type",
                    agent_id
                )));
            }
        }

        for (workflow_id, workflow) in &self.workflows {
            // Same structural checks the runtime applies at registration
            Workflow::from_config(workflow_id, workflow)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

            for (node_id, node) in &workflow.nodes {
                if node.kind == NodeKind::Agent && !self.resolves_agent_target(&node.target) {
                    return Err(ConfigError::MissingAgent(
                        node.target.clone(),
                        format!("{}.{}", workflow_id, node_id),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Whether an agent node target names a configured agent id or type
    fn resolves_agent_target(&self, target: &str) -> bool {
        self.agents.contains_key(target)
            || self
                .agents
                .values()
                .any(|a| AgentType::from_string(&a.agent_type).matches(target))
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<&AgentConfig> {
        self.agents.get(agent_id)
    }

    pub fn get_workflow(&self, workflow_id: &str) -> Option<&WorkflowConfig> {
        self.workflows.get(workflow_id)
    }

    /// Agent ids in sorted order
    pub fn agent_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }

    /// Workflow ids in sorted order
    pub fn workflow_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.workflows.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }
}

// ============= Configuration Manager =============

/// Thread-safe configuration holder with manual reloading
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<ArcSwap<SynapseConfig>>,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = SynapseConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: Some(path),
        })
    }

    /// Create a manager directly from a config. It has no backing file.
    pub fn from_config(config: SynapseConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<SynapseConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Reload the configuration from disk
    ///
    /// The previous configuration stays active if the file is missing or
    /// invalid.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(ref path) = self.config_path else {
            return Err(ConfigError::ValidationError(
                "configuration was not loaded from a file".to_string(),
            ));
        };

        info!("Reloading configuration from {:?}", path);
        let new_config = SynapseConfig::load(path)?;
        self.config.store(Arc::new(new_config));
        info!("Configuration reloaded successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_config() -> String {
        r#"
[logging]
level = "debug"
format = "json"

[dispatch]
max_concurrent = 4

[agents.loader]
type = "document_loader"
name = "Loader"
config = { require_content = true }

[agents.e1]
type = "echo"

[workflows.pipeline]
display_name = "Document pipeline"
start = "load"

[workflows.pipeline.nodes.load]
target = "loader"
transitions = { success = "echo", failure = "error" }

[workflows.pipeline.nodes.echo]
kind = "agent"
target = "ECHO"
transitions = { success = "complete" }
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = SynapseConfig::parse(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.dispatch.max_concurrent, 4);
        assert_eq!(config.engine.max_steps, 64);
        assert_eq!(config.agent_ids(), vec!["e1", "loader"]);

        let loader = config.get_agent("loader").unwrap();
        assert_eq!(loader.agent_type, "document_loader");
        assert_eq!(loader.config["require_content"], Value::Bool(true));

        let workflow = config.get_workflow("pipeline").unwrap();
        assert_eq!(workflow.start, "load");
        assert_eq!(workflow.nodes["load"].kind, NodeKind::Agent);
        assert_eq!(workflow.nodes["echo"].transitions["success"], "complete");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SynapseConfig::parse("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.dispatch.max_concurrent, 2);
        assert!(config.agents.is_empty());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = SynapseConfig::parse("[dispatch]\nmax_concurrent = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_start_node() {
        let content = r#"
[agents.e1]
type = "echo"

[workflows.w]
start = "nowhere"

[workflows.w.nodes.a]
target = "e1"
"#;
        let result = SynapseConfig::parse(content);
        assert!(
            matches!(result, Err(ConfigError::ValidationError(ref m)) if m.contains("'nowhere'"))
        );
    }

    #[test]
    fn test_undeclared_transition_target() {
        let content = r#"
[agents.e1]
type = "echo"

[workflows.w]
start = "a"

[workflows.w.nodes.a]
target = "e1"
transitions = { success = "b" }
"#;
        let result = SynapseConfig::parse(content);
        assert!(matches!(result, Err(ConfigError::ValidationError(ref m)) if m.contains("'b'")));
    }

    #[test]
    fn test_unknown_agent_target() {
        let content = r#"
[workflows.w]
start = "a"

[workflows.w.nodes.a]
target = "ghost"
transitions = { success = "complete" }
"#;
        let result = SynapseConfig::parse(content);
        assert!(matches!(result, Err(ConfigError::MissingAgent(_, _))));
    }

    #[test]
    fn test_subgraph_target_not_checked_against_agents() {
        let content = r#"
[workflows.w]
start = "g"

[workflows.w.nodes.g]
kind = "subgraph"
target = "entity_graph"
transitions = { success = "complete", failure = "error" }
"#;
        assert!(SynapseConfig::parse(content).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = SynapseConfig::load("/definitely/not/here/synapse.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_manager_reload_keeps_old_config_on_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", create_test_config()).unwrap();

        let manager = ConfigManager::new(file.path()).unwrap();
        assert_eq!(manager.config().dispatch.max_concurrent, 4);

        fs::write(file.path(), "[dispatch]\nmax_concurrent = 0\n").unwrap();
        assert!(manager.reload().is_err());
        assert_eq!(manager.config().dispatch.max_concurrent, 4);

        fs::write(file.path(), "[dispatch]\nmax_concurrent = 8\n").unwrap();
        manager.reload().unwrap();
        assert_eq!(manager.config().dispatch.max_concurrent, 8);
    }

    #[test]
    fn test_from_config_cannot_reload() {
        let manager = ConfigManager::from_config(SynapseConfig::default());
        assert!(manager.path().is_none());
        assert!(manager.reload().is_err());
    }
}
