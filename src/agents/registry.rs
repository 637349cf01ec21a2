//! Agent Registry for creating and owning live agent instances
//!
//! The registry holds two tables:
//!
//! 1. **Types** - agent type tags mapped to constructors, registered once at
//!    startup by the composition root
//! 2. **Agents** - live, initialized instances keyed by agent id
//!
//! ## Concurrency
//!
//! Mutations go through a reservation set guarded by a mutex. An id is
//! reserved before construction and released only after the instance has
//! been published (or discarded), so two concurrent `create` calls with the
//! same id cannot both succeed and readers never observe an agent that has
//! not finished `initialize`.

use crate::agents::Agent;
use crate::types::{AgentInfo, AgentResult, AgentSpec, AgentType, AppError, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Factory producing a fresh, uninitialized agent
pub type AgentConstructor = Arc<dyn Fn(AgentSpec) -> Box<dyn Agent> + Send + Sync>;

struct RegisteredType {
    agent_type: AgentType,
    /// Alternate lookup name, matched case-insensitively
    default_name: String,
    constructor: AgentConstructor,
}

impl RegisteredType {
    fn answers_to(&self, name: &str) -> bool {
        self.agent_type.matches(name) || self.default_name.eq_ignore_ascii_case(name.trim())
    }
}

/// Result of `AgentRegistry::shutdown_all`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownReport {
    /// Agents that released their resources and were removed
    pub shut_down: Vec<String>,
    /// Agents whose shutdown failed; they remain registered
    pub failed: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry that owns every live agent for the lifetime of the process
#[derive(Default)]
pub struct AgentRegistry {
    types: RwLock<Vec<RegisteredType>>,
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
    /// Ids with a create or shutdown in flight
    in_transition: Mutex<HashSet<String>>,
}

/// Releases an id reservation when dropped, including on cancellation
struct Reservation<'a> {
    registry: &'a AgentRegistry,
    agent_id: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.registry.in_transition.lock().remove(&self.agent_id);
    }
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ============= Type registration =============

    /// Register a constructor under a type tag. The tag doubles as its
    /// default lookup name.
    pub fn register_type<F>(&self, agent_type: AgentType, constructor: F) -> Result<()>
    where
        F: Fn(AgentSpec) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        let default_name = agent_type.as_str().to_string();
        self.register_type_named(agent_type, &default_name, constructor)
    }

    /// Register a constructor with an explicit default name
    ///
    /// Fails with `TypeAlreadyRegistered` if either the tag or the name is
    /// already claimed by another constructor.
    pub fn register_type_named<F>(
        &self,
        agent_type: AgentType,
        default_name: &str,
        constructor: F,
    ) -> Result<()>
    where
        F: Fn(AgentSpec) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        let mut types = self.types.write();

        let collision = types.iter().any(|t| {
            t.agent_type.same_tag(&agent_type)
                || t.answers_to(default_name)
                || t.answers_to(agent_type.as_str())
        });
        if collision {
            return Err(AppError::TypeAlreadyRegistered(format!(
                "Agent type '{}' (name '{}') is already registered",
                agent_type, default_name
            )));
        }

        tracing::debug!(agent_type = %agent_type, default_name, "Registered agent type");
        types.push(RegisteredType {
            agent_type,
            default_name: default_name.trim().to_string(),
            constructor: Arc::new(constructor),
        });
        Ok(())
    }

    /// Check if a type name resolves to a registered constructor
    pub fn has_type(&self, type_name: &str) -> bool {
        self.resolve_type(type_name).is_some()
    }

    /// Registered type tags
    pub fn type_names(&self) -> Vec<String> {
        self.types
            .read()
            .iter()
            .map(|t| t.agent_type.as_str().to_string())
            .collect()
    }

    /// Match a type name against tags first, then default names
    fn resolve_type(&self, type_name: &str) -> Option<(AgentType, AgentConstructor)> {
        let types = self.types.read();

        types
            .iter()
            .find(|t| t.agent_type.matches(type_name))
            .or_else(|| {
                types
                    .iter()
                    .find(|t| t.default_name.eq_ignore_ascii_case(type_name.trim()))
            })
            .map(|t| (t.agent_type.clone(), Arc::clone(&t.constructor)))
    }

    // ============= Agent lifecycle =============

    fn reserve(&self, agent_id: &str) -> Result<Reservation<'_>> {
        let mut in_transition = self.in_transition.lock();
        if in_transition.contains(agent_id) || self.agents.read().contains_key(agent_id) {
            return Err(AppError::DuplicateId(format!(
                "Agent '{}' is already registered",
                agent_id
            )));
        }
        in_transition.insert(agent_id.to_string());
        Ok(Reservation {
            registry: self,
            agent_id: agent_id.to_string(),
        })
    }

    /// Construct, initialize and register an agent
    ///
    /// The instance is only published if `initialize` succeeds; otherwise it
    /// is dropped and `Initialization` is returned.
    pub async fn create(
        &self,
        agent_id: &str,
        agent_name: &str,
        type_name: &str,
        config: HashMap<String, Value>,
    ) -> Result<Arc<dyn Agent>> {
        if agent_id.trim().is_empty() {
            return Err(AppError::InvalidInput("agent id must not be empty".into()));
        }

        let reservation = self.reserve(agent_id)?;

        let (agent_type, constructor) = self.resolve_type(type_name).ok_or_else(|| {
            AppError::UnknownType(format!("No constructor registered for '{}'", type_name))
        })?;

        let spec = AgentSpec {
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            agent_type: agent_type.clone(),
            config,
        };
        let agent: Arc<dyn Agent> = Arc::from(constructor(spec));

        if !agent.initialize().await {
            tracing::warn!(agent_id, agent_type = %agent_type, "Agent failed to initialize; discarding");
            return Err(AppError::Initialization(format!(
                "Agent '{}' of type '{}' failed to initialize",
                agent_id, agent_type
            )));
        }

        self.agents
            .write()
            .insert(agent_id.to_string(), Arc::clone(&agent));
        drop(reservation);

        tracing::info!(agent_id, agent_type = %agent_type, "Agent created");
        Ok(agent)
    }

    /// Get a live agent by id
    pub fn get(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.read().get(agent_id).cloned()
    }

    /// Check if an agent id is registered
    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents.read().contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }

    /// Snapshot of registered agents, ordered by id
    pub fn list(&self) -> Vec<AgentInfo> {
        let mut infos: Vec<AgentInfo> = self
            .agents
            .read()
            .iter()
            .map(|(id, agent)| AgentInfo {
                id: id.clone(),
                name: agent.agent_name().to_string(),
                agent_type: agent.agent_type(),
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Shut an agent down and remove it
    ///
    /// If the agent reports a failed shutdown it stays registered so the
    /// resource is not lost track of.
    pub async fn shutdown(&self, agent_id: &str) -> Result<()> {
        let (agent, _reservation) = {
            let mut in_transition = self.in_transition.lock();
            let agent = self
                .get(agent_id)
                .ok_or_else(|| AppError::NotFound(format!("Agent '{}' not found", agent_id)))?;
            if !in_transition.insert(agent_id.to_string()) {
                return Err(AppError::AlreadyShuttingDown(agent_id.to_string()));
            }
            (
                agent,
                Reservation {
                    registry: self,
                    agent_id: agent_id.to_string(),
                },
            )
        };

        if agent.shutdown().await {
            self.agents.write().remove(agent_id);
            tracing::info!(agent_id, "Agent shut down");
            Ok(())
        } else {
            tracing::warn!(agent_id, "Agent shutdown failed; keeping it registered");
            Err(AppError::Agent {
                agent_id: agent_id.to_string(),
                message: "shutdown failed".to_string(),
            })
        }
    }

    /// Shut down every registered agent, continuing past failures
    pub async fn shutdown_all(&self) -> ShutdownReport {
        let mut ids: Vec<String> = self.agents.read().keys().cloned().collect();
        ids.sort();

        let mut report = ShutdownReport::default();
        for id in ids {
            match self.shutdown(&id).await {
                Ok(()) => report.shut_down.push(id),
                // Another caller is already shutting it down, or just finished
                Err(AppError::AlreadyShuttingDown(_)) | Err(AppError::NotFound(_)) => {
                    tracing::debug!(agent_id = %id, "Skipping agent shut down elsewhere");
                }
                Err(e) => {
                    tracing::warn!(agent_id = %id, error = %e, "Shutdown failed during shutdown_all");
                    report.failed.push(id);
                }
            }
        }
        report
    }

    // ============= Dispatch =============

    /// Route an input to a registered agent
    pub async fn dispatch(&self, agent_id: &str, input: Value) -> Result<AgentResult> {
        let agent = self
            .get(agent_id)
            .ok_or_else(|| AppError::NotFound(format!("Agent '{}' not found", agent_id)))?;
        Self::invoke(agent.as_ref(), input).await
    }

    /// Find a workflow target: an agent id first, then the first agent (by id)
    /// whose type matches the name
    pub fn resolve_target(&self, target: &str) -> Result<Arc<dyn Agent>> {
        if let Some(agent) = self.get(target) {
            return Ok(agent);
        }

        let agents = self.agents.read();
        let mut candidates: Vec<(&String, &Arc<dyn Agent>)> = agents
            .iter()
            .filter(|(_, agent)| agent.agent_type().matches(target))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(b.0));

        candidates
            .first()
            .map(|(_, agent)| Arc::clone(agent))
            .ok_or_else(|| {
                AppError::NotFound(format!("No agent with id or type '{}' is registered", target))
            })
    }

    /// Dispatch to whatever `resolve_target` finds
    pub async fn dispatch_target(&self, target: &str, input: Value) -> Result<AgentResult> {
        let agent = self.resolve_target(target)?;
        Self::invoke(agent.as_ref(), input).await
    }

    async fn invoke(agent: &dyn Agent, input: Value) -> Result<AgentResult> {
        let started = Instant::now();
        match agent.process(input).await {
            Ok(result) => {
                tracing::debug!(
                    agent_id = agent.agent_id(),
                    success = result.success,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Agent processed input"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(
                    agent_id = agent.agent_id(),
                    operation = "process",
                    error = %e,
                    "Agent raised an unexpected error"
                );
                Err(e)
            }
        }
    }
}
