//! Core types for the service adapter abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use quorum_utils::{AdapterError, TaskResult};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// One request to a backend, fully resolved
#[derive(Debug, Clone)]
pub struct ServiceInvocation {
    /// Task the request belongs to (for logging only)
    pub task: String,
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Deadline for this single attempt
    pub timeout: Duration,
}

impl ServiceInvocation {
    /// System messages joined with blank lines, if any
    #[must_use]
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Non-system messages in order
    pub fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

/// Normalized output of one successful backend call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendReply {
    pub content: String,
    /// Model reported by the provider (falls back to the requested model)
    pub model: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    /// Provider-specific extras copied into task metadata
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl BackendReply {
    #[must_use]
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            ..Default::default()
        }
    }
}

/// A single-attempt call against one external text-generation backend.
///
/// Backends report failures as typed errors. Retry, timeout and envelope
/// normalization live in the adapter that wraps them.
#[async_trait]
pub trait ServiceBackend: Send + Sync {
    /// Provider label used in log fields and error messages
    fn provider(&self) -> &'static str;

    async fn invoke(&self, inv: &ServiceInvocation) -> Result<BackendReply, AdapterError>;
}

/// Uniform entry point the phase executor uses for every service.
///
/// `execute` never fails: every failure path produces an error-status
/// [`TaskResult`].
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Service name (registry key)
    fn name(&self) -> &str;

    /// Model this adapter requests by default
    fn model(&self) -> &str;

    /// False when the credential is absent or empty
    fn is_available(&self) -> bool;

    async fn execute(&self, prompt: &str, task: &str, timeout: Option<Duration>) -> TaskResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(messages: Vec<Message>) -> ServiceInvocation {
        ServiceInvocation {
            task: "t".to_string(),
            model: "m".to_string(),
            messages,
            temperature: 0.2,
            max_tokens: 128,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_system_prompt_joins_system_messages() {
        let inv = invocation(vec![
            Message::system("You are terse."),
            Message::user("hi"),
            Message::system("Answer in JSON."),
        ]);
        assert_eq!(
            inv.system_prompt().as_deref(),
            Some("You are terse.\n\nAnswer in JSON.")
        );
        assert_eq!(inv.conversation().count(), 1);
    }

    #[test]
    fn test_no_system_prompt() {
        let inv = invocation(vec![Message::user("hi")]);
        assert!(inv.system_prompt().is_none());
    }
}
