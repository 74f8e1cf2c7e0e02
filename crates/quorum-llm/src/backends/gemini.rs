//! Gemini `generateContent` backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use quorum_utils::AdapterError;

use crate::http_client::HttpClient;
use crate::types::{BackendReply, Role, ServiceBackend, ServiceInvocation};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiBackend {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{model}:generateContent", self.base_url)
    }

    fn build_request(inv: &ServiceInvocation) -> GeminiRequest {
        let contents = inv
            .conversation()
            .map(|m| Content {
                role: match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                }
                .to_string(),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            system_instruction: inv.system_prompt().map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: inv.temperature,
                max_output_tokens: inv.max_tokens,
            },
        }
    }

    fn parse_response(body: GeminiResponse, requested_model: &str) -> Result<BackendReply, AdapterError> {
        if body.candidates.is_empty() {
            if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(AdapterError::ProviderRejected {
                    status: 200,
                    message: format!("gemini blocked the prompt: {reason}"),
                });
            }
            return Err(AdapterError::MalformedResponse(
                "gemini response has no candidates".to_string(),
            ));
        }

        let candidate = &body.candidates[0];
        let content: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AdapterError::MalformedResponse(format!(
                "gemini response missing text content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let mut reply = BackendReply::new(
            content,
            body.model_version
                .unwrap_or_else(|| requested_model.to_string()),
        );
        if let Some(usage) = body.usage_metadata {
            reply.tokens_input = usage.prompt_token_count;
            reply.tokens_output = usage.candidates_token_count;
        }
        if let Some(reason) = &candidate.finish_reason {
            reply.extensions.insert("finish_reason".to_string(), json!(reason));
        }
        Ok(reply)
    }
}

#[async_trait]
impl ServiceBackend for GeminiBackend {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn invoke(&self, inv: &ServiceInvocation) -> Result<BackendReply, AdapterError> {
        debug!(
            provider = "gemini",
            model = %inv.model,
            task = %inv.task,
            max_tokens = inv.max_tokens,
            temperature = inv.temperature,
            "Invoking Gemini backend"
        );

        let request = self
            .http
            .client()?
            .post(self.endpoint(&inv.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request(inv));

        let body: GeminiResponse = self.http.send_json(request, inv.timeout, "gemini").await?;
        Self::parse_response(body, &inv.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use std::time::Duration;

    #[test]
    fn test_endpoint_includes_model() {
        let backend = GeminiBackend::new("k".to_string(), Some("http://localhost:1/models/".to_string()));
        assert_eq!(
            backend.endpoint("gemini-2.5-pro"),
            "http://localhost:1/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_uses_camel_case_and_system_instruction() {
        let inv = ServiceInvocation {
            task: "latency_budget".to_string(),
            model: "gemini-2.5-pro".to_string(),
            messages: vec![Message::system("Architect"), Message::user("Budget it")],
            temperature: 0.3,
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
        };

        let request = serde_json::to_value(GeminiBackend::build_request(&inv)).unwrap();

        assert_eq!(request["systemInstruction"]["parts"][0]["text"], "Architect");
        assert_eq!(request["contents"][0]["role"], "user");
        assert_eq!(request["contents"][0]["parts"][0]["text"], "Budget it");
        assert_eq!(request["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_parse_candidate_parts() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Layered "}, {"text": "design."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 30, "candidatesTokenCount": 4},
            "modelVersion": "gemini-2.5-pro-001"
        }))
        .unwrap();

        let reply = GeminiBackend::parse_response(body, "gemini-2.5-pro").unwrap();

        assert_eq!(reply.content, "Layered design.");
        assert_eq!(reply.model, "gemini-2.5-pro-001");
        assert_eq!(reply.tokens_input, Some(30));
        assert_eq!(reply.extensions["finish_reason"], "STOP");
    }

    #[test]
    fn test_blocked_prompt_is_rejection() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        match GeminiBackend::parse_response(body, "m") {
            Err(AdapterError::ProviderRejected { message, .. }) => assert!(message.contains("SAFETY")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_candidate_is_malformed() {
        let body: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();

        match GeminiBackend::parse_response(body, "m") {
            Err(AdapterError::MalformedResponse(msg)) => assert!(msg.contains("MAX_TOKENS")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
