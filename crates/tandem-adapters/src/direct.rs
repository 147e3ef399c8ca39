//! Direct API adapter — one synchronous round trip to a messages-style
//! completion endpoint.
//!
//! The request context is rendered to a prompt, sent as a single user
//! message, and the answer's text blocks come back as a structured
//! consultation result.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tandem_core::{AdapterError, AgentAdapter, AgentConfig};

use crate::recommendations::parse_recommendations;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct DirectApiAdapter {
    client: reqwest::Client,
}

impl DirectApiAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn required_str<'a>(config: &'a AgentConfig, key: &str) -> Result<&'a str, AdapterError> {
        config.get(key).and_then(|v| v.as_str()).ok_or_else(|| {
            AdapterError::Other(format!("direct_api agent config is missing '{}'", key))
        })
    }
}

impl Default for DirectApiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the projected request as a prompt. A string request passes
/// through; structured requests are embedded as pretty-printed JSON.
fn render_prompt(request: &Value) -> String {
    match request {
        Value::String(text) => text.clone(),
        other => format!(
            "Handle this customer consultation request. The structured details follow as JSON:\n\n{}\n\n\
             Provide specific, actionable recommendations with expected savings and eligibility notes.",
            serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
        ),
    }
}

/// Concatenate the text blocks of a messages-API response `content` array.
pub fn extract_message_text(response: &Value) -> Result<String, AdapterError> {
    let blocks = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            AdapterError::MalformedResponse("response has no 'content' array".to_string())
        })?;

    let text = blocks
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() {
        return Err(AdapterError::MalformedResponse(
            "no text blocks in response content".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl AgentAdapter for DirectApiAdapter {
    async fn invoke(&self, config: &AgentConfig, request: Value) -> Result<Value, AdapterError> {
        let endpoint = Self::required_str(config, "endpoint")?;
        let model = Self::required_str(config, "model")?;
        let url = format!("{}/v1/messages", endpoint.trim_end_matches('/'));

        let mut body = json!({
            "model": model,
            "max_tokens": 2048,
            "messages": [
                { "role": "user", "content": render_prompt(&request) }
            ]
        });
        if let Some(system) = config.get("system_prompt").and_then(|v| v.as_str()) {
            body["system"] = json!(system);
        }

        tracing::info!("[DirectApi] calling {} (model: {})", url, model);

        let mut req = self
            .client
            .post(&url)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json");
        if let Some(api_key) = config.get("api_key").and_then(|v| v.as_str()) {
            req = req.header("x-api-key", api_key);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AdapterError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: Value = serde_json::from_str(&response_text)
            .map_err(|e| AdapterError::MalformedResponse(format!("response is not JSON: {}", e)))?;
        let answer = extract_message_text(&parsed)?;

        Ok(json!({
            "response": answer,
            "recommendations": parse_recommendations(&answer),
            "model": parsed.get("model").and_then(|m| m.as_str()).unwrap_or(model),
        }))
    }

    async fn health(&self, config: &AgentConfig) -> bool {
        let endpoint = match Self::required_str(config, "endpoint") {
            Ok(endpoint) => endpoint,
            Err(_) => return false,
        };
        self.client
            .get(endpoint)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_request_passes_through_as_prompt() {
        assert_eq!(render_prompt(&json!("check my bill")), "check my bill");
    }

    #[test]
    fn structured_request_is_embedded_as_json() {
        let prompt = render_prompt(&json!({"current_bill": 150, "home_type": "apartment"}));
        assert!(prompt.contains("\"current_bill\": 150"));
        assert!(prompt.contains("actionable recommendations"));
    }

    #[test]
    fn message_text_concatenates_text_blocks() {
        let response = json!({
            "content": [
                {"type": "text", "text": "1. Smart thermostat program"},
                {"type": "tool_use", "id": "ignored"},
                {"type": "text", "text": "2. LED retrofit rebate"}
            ]
        });
        assert_eq!(
            extract_message_text(&response).unwrap(),
            "1. Smart thermostat program\n2. LED retrofit rebate"
        );
    }

    #[test]
    fn missing_or_empty_content_is_malformed() {
        assert!(matches!(
            extract_message_text(&json!({"id": "msg_1"})),
            Err(AdapterError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_message_text(&json!({"content": []})),
            Err(AdapterError::MalformedResponse(_))
        ));
    }
}
