//! Submit-then-poll adapter for asynchronous vendor endpoints.
//!
//! The vendor pattern: POST a message to `{endpoint}/message`, receive a
//! thread id, then GET `{endpoint}/status?threadId=..` until the run
//! reaches a terminal state. The entire poll loop lives inside `invoke`;
//! callers see a single bounded call, and the engine's step timeout is the
//! hard deadline (the loop itself never gives up).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tandem_core::{AdapterError, AgentAdapter, AgentConfig};

use crate::recommendations::parse_recommendations;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct PollingAdapter {
    client: reqwest::Client,
}

impl PollingAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn endpoint(config: &AgentConfig) -> Result<&str, AdapterError> {
        config.get("endpoint").and_then(|v| v.as_str()).ok_or_else(|| {
            AdapterError::Other("polling agent config is missing 'endpoint'".to_string())
        })
    }

    fn poll_interval(config: &AgentConfig) -> Duration {
        config
            .get("poll_interval_secs")
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    async fn fetch_json(&self, request: reqwest::RequestBuilder) -> Result<Value, AdapterError> {
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AdapterError::MalformedResponse(format!("response is not JSON: {}", e)))
    }
}

impl Default for PollingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway responses double-encode their payload: the outer JSON carries a
/// `body` field holding the inner JSON as a string.
pub fn parse_nested_body(outer: Value) -> Result<Value, AdapterError> {
    match outer.get("body") {
        Some(Value::String(inner)) => serde_json::from_str(inner).map_err(|e| {
            AdapterError::MalformedResponse(format!("inner body is not valid JSON: {}", e))
        }),
        Some(inner) => Ok(inner.clone()),
        None => Ok(outer),
    }
}

enum PollState {
    Completed(String),
    Failed(String),
    Pending,
}

fn classify_status(inner: &Value) -> PollState {
    match inner.get("status").and_then(|s| s.as_str()) {
        Some("completed") => PollState::Completed(
            inner
                .get("response")
                .and_then(|r| r.as_str())
                .unwrap_or_default()
                .to_string(),
        ),
        Some("failed") | Some("error") => PollState::Failed(
            inner
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        ),
        _ => PollState::Pending,
    }
}

#[async_trait]
impl AgentAdapter for PollingAdapter {
    async fn invoke(&self, config: &AgentConfig, request: Value) -> Result<Value, AdapterError> {
        let endpoint = Self::endpoint(config)?;
        let base = endpoint.trim_end_matches('/');
        let interval = Self::poll_interval(config);

        let prompt = match &request {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };

        let mut submission = json!({
            "role": "user",
            "message": prompt,
        });
        if let Some(system) = config.get("system_prompt").and_then(|v| v.as_str()) {
            submission["system_prompt"] = json!(system);
        }

        tracing::info!("[Polling] submitting job to {}/message", base);

        let outer = self
            .fetch_json(self.client.post(format!("{}/message", base)).json(&submission))
            .await?;
        let accepted = parse_nested_body(outer)?;
        let thread_id = accepted
            .get("threadId")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                AdapterError::MalformedResponse("submission response has no threadId".to_string())
            })?
            .to_string();

        tracing::debug!("[Polling] thread {} accepted, polling every {:?}", thread_id, interval);

        loop {
            tokio::time::sleep(interval).await;

            let outer = self
                .fetch_json(
                    self.client
                        .get(format!("{}/status", base))
                        .query(&[("threadId", thread_id.as_str())]),
                )
                .await?;
            let inner = parse_nested_body(outer)?;

            match classify_status(&inner) {
                PollState::Completed(answer) => {
                    return Ok(json!({
                        "response": answer,
                        "recommendations": parse_recommendations(&answer),
                        "thread_id": thread_id,
                    }));
                }
                PollState::Failed(error) => {
                    return Err(AdapterError::Other(format!(
                        "agent run on thread {} failed: {}",
                        thread_id, error
                    )));
                }
                PollState::Pending => {
                    tracing::debug!("[Polling] thread {} still running", thread_id);
                }
            }
        }
    }

    async fn health(&self, config: &AgentConfig) -> bool {
        let endpoint = match Self::endpoint(config) {
            Ok(endpoint) => endpoint,
            Err(_) => return false,
        };
        self.client
            .get(format!("{}/status", endpoint.trim_end_matches('/')))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .is_ok()
    }
}
