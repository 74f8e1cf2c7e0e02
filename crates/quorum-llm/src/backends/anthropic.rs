//! Anthropic Messages API backend (serves `claude`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use quorum_utils::AdapterError;

use crate::http_client::HttpClient;
use crate::types::{BackendReply, Role, ServiceBackend, ServiceInvocation};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl AnthropicBackend {
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        }
    }

    /// System messages go to the top-level `system` field, the rest to `messages`
    fn build_request(inv: &ServiceInvocation) -> AnthropicRequest {
        let messages = inv
            .conversation()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: inv.model.clone(),
            messages,
            max_tokens: inv.max_tokens,
            temperature: inv.temperature,
            system: inv.system_prompt(),
        }
    }

    fn parse_response(body: AnthropicResponse, requested_model: &str) -> Result<BackendReply, AdapterError> {
        let content: String = body
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if content.trim().is_empty() {
            return Err(AdapterError::MalformedResponse(
                "claude response missing text content".to_string(),
            ));
        }

        let mut reply = BackendReply::new(
            content,
            body.model.unwrap_or_else(|| requested_model.to_string()),
        );
        if let Some(usage) = body.usage {
            reply.tokens_input = Some(usage.input_tokens);
            reply.tokens_output = Some(usage.output_tokens);
        }
        if let Some(reason) = body.stop_reason {
            reply.extensions.insert("stop_reason".to_string(), json!(reason));
        }
        Ok(reply)
    }
}

#[async_trait]
impl ServiceBackend for AnthropicBackend {
    fn provider(&self) -> &'static str {
        "claude"
    }

    async fn invoke(&self, inv: &ServiceInvocation) -> Result<BackendReply, AdapterError> {
        debug!(
            provider = "claude",
            model = %inv.model,
            task = %inv.task,
            max_tokens = inv.max_tokens,
            temperature = inv.temperature,
            "Invoking Anthropic backend"
        );

        let request = self
            .http
            .client()?
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::build_request(inv));

        let body: AnthropicResponse = self.http.send_json(request, inv.timeout, "claude").await?;
        Self::parse_response(body, &inv.model)
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use std::time::Duration;

    #[test]
    fn test_system_prompt_lifted_out_of_messages() {
        let inv = ServiceInvocation {
            task: "narrative_variants".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            messages: vec![Message::system("Persona"), Message::user("Write it")],
            temperature: 0.8,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        };

        let request = serde_json::to_value(AnthropicBackend::build_request(&inv)).unwrap();

        assert_eq!(request["system"], "Persona");
        assert_eq!(request["messages"].as_array().unwrap().len(), 1);
        assert_eq!(request["messages"][0]["role"], "user");
    }

    #[test]
    fn test_text_blocks_concatenated() {
        let body: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude-sonnet-4-5-20250929",
            "content": [
                {"type": "text", "text": "Part one. "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "Part two."}
            ],
            "usage": {"input_tokens": 20, "output_tokens": 8},
            "stop_reason": "end_turn"
        }))
        .unwrap();

        let reply = AnthropicBackend::parse_response(body, "claude-sonnet-4-5").unwrap();

        assert_eq!(reply.content, "Part one. Part two.");
        assert_eq!(reply.model, "claude-sonnet-4-5-20250929");
        assert_eq!(reply.tokens_output, Some(8));
        assert_eq!(reply.extensions["stop_reason"], "end_turn");
    }

    #[test]
    fn test_missing_text_is_malformed() {
        let body: AnthropicResponse =
            serde_json::from_value(json!({"content": [{"type": "tool_use"}]})).unwrap();
        assert!(matches!(
            AnthropicBackend::parse_response(body, "m"),
            Err(AdapterError::MalformedResponse(_))
        ));
    }
}
