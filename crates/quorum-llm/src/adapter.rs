//! Retrying service adapter
//!
//! Wraps a single-attempt [`ServiceBackend`] with the adapter contract: a fixed
//! number of attempts with a fixed delay between them, a deadline per attempt,
//! structured-data extraction on success, and an error envelope (never an
//! `Err`) once attempts run out.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use quorum_utils::extraction::extract_structured_data;
use quorum_utils::redaction::redact_error_message;
use quorum_utils::{AdapterError, TaskMetadata, TaskResult};

use crate::types::{Message, ServiceAdapter, ServiceBackend, ServiceInvocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Request parameters applied to every call an adapter makes
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSettings {
    pub model: String,
    pub system_preamble: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt deadline when the caller gives none
    pub timeout: Duration,
    /// Deadline set in the service's own configuration. Takes precedence over
    /// any deadline the caller passes.
    pub pinned_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

pub struct RetryingAdapter {
    name: String,
    backend: Arc<dyn ServiceBackend>,
    settings: AdapterSettings,
    available: bool,
}

impl RetryingAdapter {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn ServiceBackend>,
        settings: AdapterSettings,
        available: bool,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            settings,
            available,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    fn invocation(&self, prompt: &str, task: &str, timeout: Duration) -> ServiceInvocation {
        let mut messages = Vec::with_capacity(2);
        if !self.settings.system_preamble.is_empty() {
            messages.push(Message::system(self.settings.system_preamble.clone()));
        }
        messages.push(Message::user(prompt));

        ServiceInvocation {
            task: task.to_string(),
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            timeout,
        }
    }

    async fn attempt(&self, inv: &ServiceInvocation) -> Result<crate::types::BackendReply, AdapterError> {
        match tokio::time::timeout(inv.timeout, self.backend.invoke(inv)).await {
            Ok(Ok(reply)) if reply.content.trim().is_empty() => Err(AdapterError::MalformedResponse(
                format!("{} returned empty content", self.name),
            )),
            Ok(outcome) => outcome,
            Err(_) => Err(AdapterError::Timeout {
                duration: inv.timeout,
            }),
        }
    }
}

#[async_trait]
impl ServiceAdapter for RetryingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn execute(&self, prompt: &str, task: &str, timeout: Option<Duration>) -> TaskResult {
        let started = Instant::now();
        let timeout = self
            .settings
            .pinned_timeout
            .or(timeout)
            .unwrap_or(self.settings.timeout);

        if !self.available {
            return TaskResult::error(
                task,
                &self.name,
                format!("{} credential is not configured", self.name),
                TaskMetadata {
                    model: Some(self.settings.model.clone()),
                    ..Default::default()
                },
            );
        }

        let inv = self.invocation(prompt, task, timeout);
        let max_attempts = self.settings.retry.max_attempts.max(1);
        let mut last_error: Option<AdapterError> = None;
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;
            debug!(
                service = %self.name,
                task = %task,
                attempt = attempts,
                max_attempts = max_attempts,
                "Calling service"
            );

            match self.attempt(&inv).await {
                Ok(reply) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    info!(
                        service = %self.name,
                        task = %task,
                        attempt = attempts,
                        duration_ms = duration_ms,
                        "Service call succeeded"
                    );
                    let structured_data = extract_structured_data(&reply.content);
                    let metadata = TaskMetadata {
                        model: Some(reply.model),
                        tokens_input: reply.tokens_input,
                        tokens_output: reply.tokens_output,
                        attempts,
                        duration_ms,
                        extensions: reply.extensions,
                    };
                    return TaskResult::success(task, &self.name, reply.content, structured_data, metadata);
                }
                Err(err) => {
                    let retry = err.is_retryable() && attempts < max_attempts;
                    warn!(
                        service = %self.name,
                        task = %task,
                        attempt = attempts,
                        kind = err.kind(),
                        error = %redact_error_message(&err.to_string()),
                        will_retry = retry,
                        "Service call failed"
                    );
                    let stop = !err.is_retryable();
                    last_error = Some(err);
                    if stop {
                        break;
                    }
                    if retry && !self.settings.retry.delay.is_zero() {
                        tokio::time::sleep(self.settings.retry.delay).await;
                    }
                }
            }
        }

        let (message, kind) = match &last_error {
            Some(err) => (redact_error_message(&err.to_string()), err.kind()),
            None => ("no attempt was made".to_string(), "unknown"),
        };
        let mut metadata = TaskMetadata {
            model: Some(self.settings.model.clone()),
            attempts,
            duration_ms: started.elapsed().as_millis() as u64,
            ..Default::default()
        };
        metadata.extensions.insert("error_kind".to_string(), json!(kind));

        TaskResult::error(
            task,
            &self.name,
            format!("{} failed after {attempts} attempt(s): {message}", self.name),
            metadata,
        )
    }
}
