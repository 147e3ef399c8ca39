//! Health probing across the registry.
//!
//! Answers "which registered agents look reachable right now" for an
//! external health check. Formatting the response is the surrounding
//! system's job.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::AdapterSet;
use crate::registry::AgentRegistry;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHealth {
    pub agent_id: String,
    pub agent_type: String,
    pub healthy: bool,
}

/// Probe every registered agent through its adapter, in registration order.
/// A missing adapter or an elapsed probe bound maps to `healthy = false`;
/// probes never error.
pub async fn probe_all(registry: &AgentRegistry, adapters: &AdapterSet) -> Vec<AgentHealth> {
    let mut out = Vec::new();
    for descriptor in registry.list_all().await {
        let healthy = match adapters.get(&descriptor.agent_type) {
            Some(adapter) => {
                tokio::time::timeout(PROBE_TIMEOUT, adapter.health(&descriptor.config))
                    .await
                    .unwrap_or(false)
            }
            None => false,
        };
        if !healthy {
            tracing::warn!(
                "[Health] agent '{}' ({}) is unhealthy",
                descriptor.agent_id,
                descriptor.agent_type
            );
        }
        out.push(AgentHealth {
            agent_id: descriptor.agent_id,
            agent_type: descriptor.agent_type,
            healthy,
        });
    }
    out
}
