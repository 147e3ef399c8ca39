//! Simulated agent adapter — deterministic, network-free responder
//! standing in for enterprise systems during development and demos.
//!
//! Output comes from the agent's `response_template` config entry; the
//! request's `customer_id` is echoed into it so downstream steps see a
//! response correlated with their input. Optional `latency_ms` models
//! vendor timing.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use tandem_core::{AdapterError, AgentAdapter, AgentConfig};

pub struct SimulatedAdapter;

impl SimulatedAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimulatedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentAdapter for SimulatedAdapter {
    async fn invoke(&self, config: &AgentConfig, request: Value) -> Result<Value, AdapterError> {
        let latency = config.get("latency_ms").and_then(|v| v.as_u64()).unwrap_or(0);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let mut output = config
            .get("response_template")
            .cloned()
            .unwrap_or_else(|| json!({"simulated": true}));

        if let Value::Object(out) = &mut output {
            if let Some(customer_id) = request.get("customer_id") {
                out.insert("customer_id".to_string(), customer_id.clone());
            }
            out.insert(
                "request_id".to_string(),
                json!(format!("sim-{}", Uuid::new_v4())),
            );
        }

        tracing::debug!("[Simulated] produced synthetic response ({}ms latency)", latency);
        Ok(output)
    }

    async fn health(&self, _config: &AgentConfig) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_template() -> AgentConfig {
        let mut config = AgentConfig::new();
        config.insert(
            "response_template".to_string(),
            json!({
                "account_status": {"status": "active", "account_type": "residential"},
                "eligibility_summary": {"recommended_programs": ["smart_thermostat_program"]}
            }),
        );
        config
    }

    #[tokio::test]
    async fn template_is_returned_with_request_correlation() {
        let adapter = SimulatedAdapter::new();
        let output = adapter
            .invoke(&config_with_template(), json!({"customer_id": "12345"}))
            .await
            .unwrap();

        assert_eq!(output["account_status"]["status"], json!("active"));
        assert_eq!(output["customer_id"], json!("12345"));
        assert!(output["request_id"].as_str().unwrap().starts_with("sim-"));
    }

    #[tokio::test]
    async fn missing_template_yields_marker_object() {
        let adapter = SimulatedAdapter::new();
        let output = adapter.invoke(&AgentConfig::new(), json!({})).await.unwrap();
        assert_eq!(output["simulated"], json!(true));
        assert!(output.get("request_id").is_some());
    }

    #[tokio::test]
    async fn health_is_always_reachable() {
        let adapter = SimulatedAdapter::new();
        assert!(adapter.health(&AgentConfig::new()).await);
    }
}
