//! Agent roster loading — which agents exist and how to reach them.

use serde::Deserialize;
use serde_json::json;

use tandem_core::AgentDescriptor;

/// YAML document listing the agents to register at startup:
///
/// ```yaml
/// agents:
///   - agent_id: "customer-processor"
///     agent_type: "webhook"
///     capabilities: ["customer_processing", "data_analysis"]
///     config:
///       webhook_url: "https://flows.example.com/webhook/customer-intake"
/// ```
#[derive(Debug, Deserialize)]
pub struct AgentRoster {
    pub agents: Vec<AgentDescriptor>,
}

impl AgentRoster {
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse agent roster YAML: {}", e))
    }

    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read agent roster '{}': {}", path, e))?;
        Self::from_yaml(&content)
    }

    /// Demo roster mirroring a full vendor deployment, with placeholder
    /// endpoints: two webhook automations, a simulated enterprise system,
    /// a polling consultation service, and a direct-API standby.
    pub fn builtin() -> Self {
        Self {
            agents: vec![
                AgentDescriptor::new("n8n-customer-processor", "webhook")
                    .with_capability("customer_processing")
                    .with_capability("data_analysis")
                    .with_config(
                        "webhook_url",
                        json!("https://flows.example.com/webhook/customer-intake"),
                    ),
                AgentDescriptor::new("sap-enterprise-enricher", "simulated")
                    .with_capability("enterprise_data_enrichment")
                    .with_config("latency_ms", json!(250))
                    .with_config(
                        "response_template",
                        json!({
                            "account_status": {
                                "status": "active",
                                "account_type": "residential",
                                "payment_standing": "good",
                            },
                            "billing_history": {
                                "average_monthly_bill": 148.50,
                                "billing_trend": "stable",
                            },
                            "energy_consumption": {
                                "average_kwh_monthly": 820,
                                "usage_pattern": "seasonal_peaks",
                            },
                            "eligibility_summary": {
                                "recommended_programs": [
                                    "energy_efficiency_rebate",
                                    "smart_thermostat_program",
                                ],
                                "restrictions": [],
                            },
                        }),
                    ),
                AgentDescriptor::new("nova-energy-consultant", "polling")
                    .with_capability("energy_consultation")
                    .with_capability("energy_efficiency")
                    .with_config("endpoint", json!("https://gateway.example.com/prod"))
                    .with_config("poll_interval_secs", json!(5))
                    .with_config(
                        "system_prompt",
                        json!(
                            "You are a customer service agent for an energy company. \
                             Provide clear, accurate information about energy efficiency \
                             programs and services."
                        ),
                    ),
                AgentDescriptor::new("standby-energy-consultant", "direct_api")
                    .with_capability("energy_consultation")
                    .with_capability("customer_service")
                    .with_config("endpoint", json!("https://api.example.com"))
                    .with_config("model", json!("consult-large-v2")),
                AgentDescriptor::new("crm-service-history", "webhook")
                    .with_capability("crm_service_history")
                    .with_config(
                        "webhook_url",
                        json!("https://flows.example.com/webhook/service-history"),
                    ),
                AgentDescriptor::new("n8n-recommendation-validator", "webhook")
                    .with_capability("recommendation_validation")
                    .with_capability("compliance_check")
                    .with_config(
                        "webhook_url",
                        json!("https://flows.example.com/webhook/validate-recommendations"),
                    ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_yaml_parses_into_descriptors() {
        let yaml = r#"
agents:
  - agent_id: "customer-processor"
    agent_type: "webhook"
    capabilities: ["customer_processing"]
    config:
      webhook_url: "https://flows.example.com/webhook/intake"
  - agent_id: "advisor"
    agent_type: "direct_api"
    capabilities: ["energy_consultation", "customer_service"]
    config:
      endpoint: "https://api.example.com"
      model: "consult-large-v2"
"#;
        let roster = AgentRoster::from_yaml(yaml).unwrap();
        assert_eq!(roster.agents.len(), 2);
        assert_eq!(roster.agents[0].agent_id, "customer-processor");
        assert_eq!(
            roster.agents[0].config_str("webhook_url"),
            Some("https://flows.example.com/webhook/intake")
        );
        assert!(roster.agents[1].has_capability("customer_service"));
    }

    #[test]
    fn missing_agents_key_is_an_error() {
        assert!(AgentRoster::from_yaml("pipelines: []").is_err());
    }

    #[tokio::test]
    async fn builtin_roster_registers_cleanly() {
        let registry = tandem_core::AgentRegistry::new();
        for agent in AgentRoster::builtin().agents {
            registry.register(agent).await.unwrap();
        }
        assert_eq!(registry.len().await, 6);
        // Every required consultation capability is covered.
        for capability in [
            "customer_processing",
            "enterprise_data_enrichment",
            "energy_consultation",
            "crm_service_history",
            "recommendation_validation",
        ] {
            assert!(
                !registry.find_by_capability(capability).await.is_empty(),
                "no agent covers '{}'",
                capability
            );
        }
    }
}
