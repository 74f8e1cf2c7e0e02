//! Task result envelope shared by adapters, the phase executor and the aggregator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a task after all retry attempts have resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

impl TaskStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model, usage and timing information attached to a task result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Model that actually served the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Input tokens consumed (if the backend reports usage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<u64>,
    /// Output tokens generated (if the backend reports usage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_output: Option<u64>,
    /// Number of attempts made, including the successful one
    #[serde(default)]
    pub attempts: u32,
    /// Wall-clock time across all attempts, including backoff delays
    #[serde(default)]
    pub duration_ms: u64,
    /// Backend-specific extras (citations, finish reasons, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Normalized result envelope for one task execution.
///
/// A `TaskResult` is always complete: adapters either produce one from a
/// backend reply or build an error envelope. It is never mutated after the
/// adapter (or the phase executor, for uncaught failures) hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task name within its phase
    pub task: String,
    /// Service the task was bound to
    pub service: String,
    pub status: TaskStatus,
    /// Free-text output of the backend
    #[serde(default)]
    pub content: Option<String>,
    /// Nested document extracted from `content`, if any could be parsed
    #[serde(default)]
    pub structured_data: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: TaskMetadata,
    /// Last error message when `status` is `error`
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskResult {
    /// Build a success envelope
    #[must_use]
    pub fn success(
        task: impl Into<String>,
        service: impl Into<String>,
        content: impl Into<String>,
        structured_data: Option<serde_json::Value>,
        metadata: TaskMetadata,
    ) -> Self {
        Self {
            task: task.into(),
            service: service.into(),
            status: TaskStatus::Success,
            content: Some(content.into()),
            structured_data,
            metadata,
            error: None,
        }
    }

    /// Build an error envelope carrying `message`
    #[must_use]
    pub fn error(
        task: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
        metadata: TaskMetadata,
    ) -> Self {
        Self {
            task: task.into(),
            service: service.into(),
            status: TaskStatus::Error,
            content: None,
            structured_data: None,
            metadata,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    /// Content with surrounding whitespace removed, `None` if absent or blank
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(TaskStatus::Success).unwrap(),
            json!("success")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Error).unwrap(),
            json!("error")
        );
    }

    #[test]
    fn test_error_envelope_is_complete() {
        let result = TaskResult::error("funding_scan", "perplexity", "boom", TaskMetadata::default());
        assert_eq!(result.status, TaskStatus::Error);
        assert!(result.content.is_none());
        assert!(result.structured_data.is_none());
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(!result.is_success());
    }

    #[test]
    fn test_text_ignores_blank_content() {
        let mut result = TaskResult::success(
            "closing_statement",
            "claude",
            "   ",
            None,
            TaskMetadata::default(),
        );
        assert_eq!(result.text(), None);

        result.content = Some("  Thank you.  ".to_string());
        assert_eq!(result.text(), Some("Thank you."));
    }

    #[test]
    fn test_metadata_omits_empty_fields() {
        let value = serde_json::to_value(TaskMetadata {
            attempts: 1,
            duration_ms: 12,
            ..Default::default()
        })
        .unwrap();
        assert!(value.get("model").is_none());
        assert!(value.get("extensions").is_none());
        assert_eq!(value["attempts"], 1);
    }
}
