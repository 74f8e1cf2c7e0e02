//! Network backends, one per wire schema

mod anthropic;
mod chat_completions;
mod gemini;

pub use anthropic::AnthropicBackend;
pub use chat_completions::{ChatCompletionsBackend, ChatFlavor};
pub use gemini::GeminiBackend;

use std::sync::Arc;

use quorum_utils::AdapterError;

use crate::types::ServiceBackend;

/// Build the backend that serves `service`
///
/// # Errors
///
/// Returns `AdapterError::Misconfiguration` for a service with no backend.
pub fn backend_for(
    service: &str,
    api_key: String,
    base_url: Option<String>,
) -> Result<Arc<dyn ServiceBackend>, AdapterError> {
    let backend: Arc<dyn ServiceBackend> = match service {
        "openai" => Arc::new(ChatCompletionsBackend::new(ChatFlavor::OpenAi, api_key, base_url)),
        "grok" => Arc::new(ChatCompletionsBackend::new(ChatFlavor::Grok, api_key, base_url)),
        "perplexity" => Arc::new(ChatCompletionsBackend::new(
            ChatFlavor::Perplexity,
            api_key,
            base_url,
        )),
        "claude" => Arc::new(AnthropicBackend::new(api_key, base_url)),
        "gemini" => Arc::new(GeminiBackend::new(api_key, base_url)),
        other => {
            return Err(AdapterError::Misconfiguration(format!(
                "no backend for service '{other}'"
            )));
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_service_has_backend() {
        for name in quorum_config::SERVICE_NAMES {
            let backend = backend_for(name, "k".to_string(), None).unwrap();
            assert_eq!(backend.provider(), name);
        }
    }

    #[test]
    fn test_unknown_service() {
        assert!(matches!(
            backend_for("llama", "k".to_string(), None),
            Err(AdapterError::Misconfiguration(_))
        ));
    }
}
