//! Webhook agent adapter — fires a JSON POST at an automation-platform
//! webhook and normalizes its response.
//!
//! The platforms this targets answer with a JSON object, with an empty
//! body, or with a one-element array wrapping the real output under an
//! `output` key. All three shapes are normalized here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};

use tandem_core::{AdapterError, AgentAdapter, AgentConfig};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct WebhookAdapter {
    client: reqwest::Client,
}

impl WebhookAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn webhook_url(config: &AgentConfig) -> Result<&str, AdapterError> {
        config
            .get("webhook_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AdapterError::Other("webhook agent config is missing 'webhook_url'".to_string())
            })
    }
}

impl Default for WebhookAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap the projected request in the webhook envelope the receiving flows
/// expect: the request fields plus `timestamp` and `source`.
fn build_payload(request: Value) -> Value {
    let mut payload = match request {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    payload.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    payload.insert("source".to_string(), json!("tandem-orchestrator"));
    Value::Object(payload)
}

/// Unwrap array responses: `[{"output": ...}]` carries the real result in
/// its first element.
pub fn extract_webhook_output(value: Value) -> Value {
    match value {
        Value::Array(mut items) if !items.is_empty() => {
            let first = items.swap_remove(0);
            match first {
                Value::Object(mut obj) => obj.remove("output").unwrap_or(Value::Object(obj)),
                other => other,
            }
        }
        other => other,
    }
}

#[async_trait]
impl AgentAdapter for WebhookAdapter {
    async fn invoke(&self, config: &AgentConfig, request: Value) -> Result<Value, AdapterError> {
        let url = Self::webhook_url(config)?;
        let payload = build_payload(request);

        tracing::info!("[Webhook] calling agent at {}", url);

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(format!("webhook request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AdapterError::Transport(format!("failed to read webhook response: {}", e))
        })?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            // Some flows acknowledge without a body.
            return Ok(json!({"message": "accepted with empty body"}));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            AdapterError::MalformedResponse(format!("webhook returned non-JSON body: {}", e))
        })?;
        Ok(extract_webhook_output(value))
    }

    async fn health(&self, config: &AgentConfig) -> bool {
        let url = match Self::webhook_url(config) {
            Ok(url) => url,
            Err(_) => return false,
        };
        // Any HTTP response counts as reachable; webhook endpoints commonly
        // reject GET probes with 4xx.
        self.client
            .get(url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .is_ok()
    }
}
