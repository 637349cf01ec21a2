use crate::{
    agents::{validate_input, Agent, AgentState},
    types::{AgentResult, AgentSpec, AgentType, AppError, Result},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

/// Agent that hands its input straight back.
///
/// Useful as a workflow placeholder and for smoke-testing a deployment.
pub struct EchoAgent {
    id: String,
    name: String,
    state: Mutex<AgentState>,
}

impl EchoAgent {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            state: Mutex::new(AgentState::Uninitialized),
        }
    }

    pub fn from_spec(spec: AgentSpec) -> Self {
        Self::new(&spec.agent_id, &spec.agent_name)
    }

    pub fn state(&self) -> AgentState {
        *self.state.lock()
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn agent_name(&self) -> &str {
        &self.name
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Echo
    }

    async fn initialize(&self) -> bool {
        *self.state.lock() = AgentState::Initialized;
        true
    }

    async fn process(&self, input: Value) -> Result<AgentResult> {
        if self.state() != AgentState::Initialized {
            return Err(AppError::Agent {
                agent_id: self.id.clone(),
                message: format!("process called in state {:?}", self.state()),
            });
        }

        if let Some(invalid) = validate_input(&input) {
            return Ok(invalid);
        }

        Ok(AgentResult::success(input, "echoed"))
    }

    async fn shutdown(&self) -> bool {
        *self.state.lock() = AgentState::ShutDown;
        true
    }
}
