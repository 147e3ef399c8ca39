//! Agent descriptors and the capability-based registry.
//!
//! The registry is process-scoped and memory-resident: descriptors exist
//! from registration until explicit deregistration or teardown. It is the
//! only shared mutable state in the system; reads are concurrent, writes
//! exclusive.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::EngineError;

/// Opaque key/value configuration interpreted only by the adapter that
/// serves the agent (endpoint URL, model name, credentials reference).
pub type AgentConfig = serde_json::Map<String, serde_json::Value>;

/// Identity and wiring of one remote agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique within the registry.
    pub agent_id: String,

    /// Selects which adapter implementation handles this agent,
    /// e.g. "webhook", "direct_api", "polling", "simulated".
    pub agent_type: String,

    /// Capability tags. Matching is exact-string membership, no hierarchy.
    pub capabilities: Vec<String>,

    #[serde(default)]
    pub config: AgentConfig,
}

impl AgentDescriptor {
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            capabilities: Vec::new(),
            config: AgentConfig::new(),
        }
    }

    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.push(capability.to_string());
        self
    }

    pub fn with_config(mut self, key: &str, value: serde_json::Value) -> Self {
        self.config.insert(key.to_string(), value);
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Convenience accessor for string-valued config entries.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.agent_id.trim().is_empty() {
            return Err(EngineError::InvalidDescriptor(
                "agent_id must not be empty".to_string(),
            ));
        }
        if self.capabilities.is_empty() {
            return Err(EngineError::InvalidDescriptor(format!(
                "agent '{}' declares no capabilities",
                self.agent_id
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RegistryInner {
    agents: HashMap<String, AgentDescriptor>,
    /// Registration order; re-registration keeps the original position.
    order: Vec<String>,
}

/// Shared handle to the agent registry. Cloning is cheap and all clones
/// observe the same state.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the descriptor under its `agent_id`.
    pub async fn register(&self, descriptor: AgentDescriptor) -> Result<(), EngineError> {
        descriptor.validate()?;
        let mut inner = self.inner.write().await;
        if !inner.agents.contains_key(&descriptor.agent_id) {
            inner.order.push(descriptor.agent_id.clone());
        }
        tracing::info!(
            "[Registry] registered {} agent '{}' with capabilities {:?}",
            descriptor.agent_type,
            descriptor.agent_id,
            descriptor.capabilities
        );
        inner.agents.insert(descriptor.agent_id.clone(), descriptor);
        Ok(())
    }

    pub async fn deregister(&self, agent_id: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        if inner.agents.remove(agent_id).is_none() {
            return Err(EngineError::NotFound(format!("agent '{}'", agent_id)));
        }
        inner.order.retain(|id| id != agent_id);
        Ok(())
    }

    pub async fn get(&self, agent_id: &str) -> Result<AgentDescriptor, EngineError> {
        let inner = self.inner.read().await;
        inner
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("agent '{}'", agent_id)))
    }

    /// All agents holding the capability, in registration order. The engine
    /// picks the first entry when it must choose exactly one.
    pub async fn find_by_capability(&self, capability: &str) -> Vec<AgentDescriptor> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id))
            .filter(|a| a.has_capability(capability))
            .cloned()
            .collect()
    }

    /// Every registered agent, in registration order.
    pub async fn list_all(&self) -> Vec<AgentDescriptor> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.agents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
