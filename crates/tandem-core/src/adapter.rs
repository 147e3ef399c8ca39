//! The uniform adapter contract every agent type satisfies.
//!
//! The engine is written against [`AgentAdapter`] only: vendor payload
//! shapes, authentication schemes, and polling cadence are internal to each
//! implementation. An adapter whose underlying call pattern is
//! "submit, then poll until ready" must run the entire poll loop inside
//! [`AgentAdapter::invoke`] and return only on terminal completion, terminal
//! failure, or cancellation by the caller's deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::registry::AgentConfig;

/// Any failure surfaced by a concrete agent call, normalized at the adapter
/// boundary. The engine converts these into degraded steps; they never
/// propagate to the caller as a failure of the whole run.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("agent returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed agent response: {0}")]
    MalformedResponse(String),

    #[error("agent call timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Call the agent with the step's projected request and return its
    /// structured output. The engine bounds this call with the step timeout;
    /// implementations may block on I/O or poll internally as long as they
    /// respect cancellation.
    async fn invoke(&self, config: &AgentConfig, request: Value) -> Result<Value, AdapterError>;

    /// Cheap reachability probe. Must never error past this boundary;
    /// internal failures map to `false`.
    async fn health(&self, config: &AgentConfig) -> bool;
}

/// Maps `agent_type` tags to adapter implementations. Built once at startup
/// and immutable afterwards; the engine dispatches through this map and
/// holds no branch on agent type.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<String, Arc<dyn AgentAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent_type: impl Into<String>, adapter: Arc<dyn AgentAdapter>) {
        self.adapters.insert(agent_type.into(), adapter);
    }

    pub fn with(mut self, agent_type: impl Into<String>, adapter: Arc<dyn AgentAdapter>) -> Self {
        self.insert(agent_type, adapter);
        self
    }

    pub fn get(&self, agent_type: &str) -> Option<Arc<dyn AgentAdapter>> {
        self.adapters.get(agent_type).cloned()
    }

    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.adapters.keys().cloned().collect();
        types.sort();
        types
    }
}
