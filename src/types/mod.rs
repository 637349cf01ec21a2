use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============= Agent Result =============

/// Outcome envelope returned by every agent invocation.
///
/// `error` is only populated on failure, and `data` is only meaningful on
/// success. Use the constructors rather than building the struct by hand so
/// the two stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
}

impl AgentResult {
    /// Successful result carrying `data`
    pub fn success(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            metrics: None,
        }
    }

    /// Failed result with the given reason
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            data: None,
            message: error.clone(),
            error: Some(error),
            metrics: None,
        }
    }

    /// Failed result for malformed or missing input
    pub fn validation_error(reason: impl Into<String>) -> Self {
        let mut result = Self::failure(reason);
        result.message = "Input validation failed".to_string();
        result
    }

    /// Attach a metric, creating the metrics map on first use
    pub fn with_metric(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metrics
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Payload carried forward to the next workflow node
    pub fn payload(&self) -> Value {
        if self.success {
            self.data.clone().unwrap_or(Value::Null)
        } else {
            Value::Null
        }
    }
}

// ============= Agent Types =============

/// Closed set of known agent capabilities, extensible through `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    Builder,
    Analyst,
    Auditor,
    ExtensionLoader,
    Echo,
    DocumentLoader,
    Custom(String),
}

impl AgentType {
    /// Canonical lowercase tag for this type
    pub fn as_str(&self) -> &str {
        match self {
            AgentType::Builder => "builder",
            AgentType::Analyst => "analyst",
            AgentType::Auditor => "auditor",
            AgentType::ExtensionLoader => "extension_loader",
            AgentType::Echo => "echo",
            AgentType::DocumentLoader => "document_loader",
            AgentType::Custom(name) => name.as_str(),
        }
    }

    /// Parse a tag, falling back to `Custom` for anything unrecognised
    pub fn from_string(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "builder" => AgentType::Builder,
            "analyst" => AgentType::Analyst,
            "auditor" => AgentType::Auditor,
            "extension_loader" | "extensionloader" => AgentType::ExtensionLoader,
            "echo" => AgentType::Echo,
            "document_loader" | "documentloader" => AgentType::DocumentLoader,
            _ => AgentType::Custom(normalized),
        }
    }

    /// Case-insensitive comparison against a tag or alias
    pub fn matches(&self, name: &str) -> bool {
        self.normalized() == AgentType::from_string(name)
    }

    /// Same tag, ignoring how a `Custom` name was cased
    pub fn same_tag(&self, other: &AgentType) -> bool {
        self.normalized() == other.normalized()
    }

    fn normalized(&self) -> AgentType {
        match self {
            AgentType::Custom(name) => AgentType::from_string(name),
            known => known.clone(),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AgentType {
    fn from(s: String) -> Self {
        AgentType::from_string(&s)
    }
}

impl From<AgentType> for String {
    fn from(agent_type: AgentType) -> Self {
        agent_type.as_str().to_string()
    }
}

impl FromStr for AgentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(AppError::InvalidInput("agent type must not be empty".into()));
        }
        Ok(AgentType::from_string(s))
    }
}

/// Everything a constructor needs to build one agent instance
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub agent_id: String,
    pub agent_name: String,
    pub agent_type: AgentType,
    pub config: HashMap<String, Value>,
}

/// Snapshot of a registered agent, as returned by `AgentRegistry::list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub agent_type: AgentType,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Type already registered: {0}")]
    TypeAlreadyRegistered(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent '{0}' is already shutting down")]
    AlreadyShuttingDown(String),

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error("Workflow incomplete: '{workflow_id}' stalled at node '{node_id}' (no transition for outcome '{label}')")]
    WorkflowStalled {
        workflow_id: String,
        node_id: String,
        label: String,
    },

    #[error("Workflow '{workflow_id}' exceeded the step limit of {limit}")]
    StepLimitExceeded { workflow_id: String, limit: usize },

    #[error("Agent '{agent_id}' failed: {message}")]
    Agent { agent_id: String, message: String },

    #[error("External graph error: {0}")]
    ExternalGraph(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable tag for mapping errors onto transport responses
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::DuplicateId(_) => "duplicate_id",
            AppError::TypeAlreadyRegistered(_) => "type_already_registered",
            AppError::UnknownType(_) => "unknown_type",
            AppError::Initialization(_) => "initialization",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::AlreadyShuttingDown(_) => "already_shutting_down",
            AppError::InvalidWorkflow(_) => "invalid_workflow",
            AppError::WorkflowStalled { .. } => "workflow_stalled",
            AppError::StepLimitExceeded { .. } => "step_limit_exceeded",
            AppError::Agent { .. } => "agent",
            AppError::ExternalGraph(_) => "external_graph",
            AppError::Configuration(_) => "configuration",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
