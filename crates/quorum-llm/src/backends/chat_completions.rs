//! OpenAI-compatible chat completions backend
//!
//! Serves `openai`, `grok` (xAI) and `perplexity`, which all speak the same
//! `/chat/completions` schema. Perplexity additionally returns a top-level
//! `citations` array, copied into the reply extensions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use quorum_utils::AdapterError;

use crate::http_client::HttpClient;
use crate::types::{BackendReply, ServiceBackend, ServiceInvocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFlavor {
    OpenAi,
    Grok,
    Perplexity,
}

impl ChatFlavor {
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Grok => "grok",
            Self::Perplexity => "perplexity",
        }
    }

    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Grok => "https://api.x.ai/v1/chat/completions",
            Self::Perplexity => "https://api.perplexity.ai/chat/completions",
        }
    }
}

pub struct ChatCompletionsBackend {
    flavor: ChatFlavor,
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl ChatCompletionsBackend {
    #[must_use]
    pub fn new(flavor: ChatFlavor, api_key: String, base_url: Option<String>) -> Self {
        Self {
            flavor,
            http: HttpClient::new(),
            base_url: base_url.unwrap_or_else(|| flavor.default_base_url().to_string()),
            api_key,
        }
    }

    fn build_request(inv: &ServiceInvocation) -> ChatRequest {
        let messages = inv
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        ChatRequest {
            model: inv.model.clone(),
            messages,
            temperature: inv.temperature,
            max_tokens: inv.max_tokens,
        }
    }

    fn parse_response(
        &self,
        body: ChatResponse,
        requested_model: &str,
    ) -> Result<BackendReply, AdapterError> {
        let provider = self.flavor.provider();
        let choice = body.choices.into_iter().next().ok_or_else(|| {
            AdapterError::MalformedResponse(format!("{provider} response has no choices"))
        })?;

        let content = choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                AdapterError::MalformedResponse(format!("{provider} response missing text content"))
            })?;

        let mut reply = BackendReply::new(
            content,
            body.model.unwrap_or_else(|| requested_model.to_string()),
        );

        if let Some(usage) = body.usage {
            reply.tokens_input = usage.prompt_tokens;
            reply.tokens_output = usage.completion_tokens;
        }
        if let Some(reason) = choice.finish_reason {
            reply.extensions.insert("finish_reason".to_string(), json!(reason));
        }
        if self.flavor == ChatFlavor::Perplexity
            && let Some(citations) = body.citations.filter(|c| !c.is_empty())
        {
            reply.extensions.insert("citations".to_string(), json!(citations));
        }

        Ok(reply)
    }
}

#[async_trait]
impl ServiceBackend for ChatCompletionsBackend {
    fn provider(&self) -> &'static str {
        self.flavor.provider()
    }

    async fn invoke(&self, inv: &ServiceInvocation) -> Result<BackendReply, AdapterError> {
        let provider = self.flavor.provider();
        debug!(
            provider = provider,
            model = %inv.model,
            task = %inv.task,
            max_tokens = inv.max_tokens,
            temperature = inv.temperature,
            "Invoking chat completions backend"
        );

        let request = self
            .http
            .client()?
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&Self::build_request(inv));

        let body: ChatResponse = self.http.send_json(request, inv.timeout, provider).await?;
        self.parse_response(body, &inv.model)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    citations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}
