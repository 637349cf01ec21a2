//! Mock implementations for testing.
//!
//! Rule-driven agents whose behaviour is fixed at construction, and a
//! mockall-generated external graph engine.

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use synapse::agents::{Agent, AgentRegistry};
use synapse::types::{AgentResult, AgentSpec, AgentType, Result};
use synapse::workflows::{GraphEngine, GraphResult};

/// Decides the result of every `process` call
pub type Rule = Arc<dyn Fn(&Value) -> AgentResult + Send + Sync>;

/// Agent whose output is computed by a rule.
///
/// The `AgentSpec` config map controls the lifecycle:
/// - `fail_init = true` makes `initialize` return false
/// - `fail_shutdown = true` makes `shutdown` return false
pub struct RuleAgent {
    id: String,
    name: String,
    agent_type: AgentType,
    rule: Rule,
    fail_init: bool,
    fail_shutdown: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Agent for RuleAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn agent_name(&self) -> &str {
        &self.name
    }

    fn agent_type(&self) -> AgentType {
        self.agent_type.clone()
    }

    async fn initialize(&self) -> bool {
        !self.fail_init
    }

    async fn process(&self, input: Value) -> Result<AgentResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.rule)(&input))
    }

    async fn shutdown(&self) -> bool {
        !self.fail_shutdown
    }
}

/// Register a rule-driven type. Returns the shared call counter.
pub fn register_rule_type(
    registry: &AgentRegistry,
    agent_type: AgentType,
    rule: Rule,
) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry
        .register_type(agent_type, move |spec: AgentSpec| {
            let flag = |key: &str| spec.config.get(key).and_then(Value::as_bool).unwrap_or(false);
            Box::new(RuleAgent {
                fail_init: flag("fail_init"),
                fail_shutdown: flag("fail_shutdown"),
                id: spec.agent_id,
                name: spec.agent_name,
                agent_type: spec.agent_type,
                rule: Arc::clone(&rule),
                calls: Arc::clone(&counter),
            }) as Box<dyn Agent>
        })
        .expect("type registration");
    calls
}

/// Echoes its input back as data
pub fn echo_rule() -> Rule {
    Arc::new(|input: &Value| AgentResult::success(input.clone(), "echoed"))
}

/// Always fails with the given reason
pub fn reject_rule(reason: &'static str) -> Rule {
    Arc::new(move |_: &Value| AgentResult::failure(reason))
}

mock! {
    pub Graphs {}

    #[async_trait]
    impl GraphEngine for Graphs {
        async fn run_graph(&self, graph_name: &str, payload: Value) -> Result<GraphResult>;
        fn has_graph(&self, graph_name: &str) -> bool;
    }
}
