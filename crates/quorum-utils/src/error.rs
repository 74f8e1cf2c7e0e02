//! Error taxonomy for quorum
//!
//! Library crates return these typed errors; the CLI and orchestration glue
//! wrap them in `anyhow` with context. Adapter errors never escape a service
//! adapter: they are folded into an error-status `TaskResult` after retries.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type
#[derive(Error, Debug)]
pub enum QuorumError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    #[error("Pipeline halted at phase {phase} (gate {status})")]
    Halted { phase: String, status: String },

    /// A prior run's output directory is missing or unreadable
    #[error("Run artifacts unavailable in {dir}: {reason}")]
    Artifacts { dir: String, reason: String },
}

/// Failure of a single backend call.
///
/// The first five kinds correspond to transport, timeout, provider and
/// malformed-response failures and are retried by the adapter. Auth and
/// misconfiguration failures are retried too (the provider decides what a
/// rejected credential means), but are reported distinctly so the final
/// error message is actionable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Network-level failure (DNS, connect, TLS, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Attempt exceeded its deadline
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Provider rejected the credential (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider rate limit or quota exhausted (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider-side failure (5xx)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Any other non-success status, including content-safety blocks
    #[error("Provider rejected request (status {status}): {message}")]
    ProviderRejected { status: u16, message: String },

    /// Response body could not be decoded into the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Adapter cannot issue a request at all
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl AdapterError {
    /// Whether another attempt may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Misconfiguration(_))
    }

    /// Short machine-readable kind, recorded in task metadata
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout { .. } => "timeout",
            Self::ProviderAuth(_) => "provider_auth",
            Self::ProviderQuota(_) => "provider_quota",
            Self::ProviderOutage(_) => "provider_outage",
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Misconfiguration(_) => "misconfiguration",
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Configuration file not found: {0}")]
    NotFound(String),
}

/// Trait for providing user-friendly error reporting with suggestions
pub trait UserFriendlyError {
    fn user_message(&self) -> String;

    fn suggestions(&self) -> Vec<String>;

    fn category(&self) -> ErrorCategory;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ServiceCall,
    FileSystem,
    Pipeline,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::ServiceCall => write!(f, "Service Call"),
            Self::FileSystem => write!(f, "File System"),
            Self::Pipeline => write!(f, "Pipeline"),
        }
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Section names are [defaults], [services.<name>], [[phases]] and [context]"
                    .to_string(),
            ],
            Self::InvalidValue { key, .. } => {
                vec![format!("Correct the value of '{key}' and re-run")]
            }
            Self::MissingRequired(what) => vec![format!("Add {what} to the configuration")],
            Self::NotFound(path) => vec![
                format!("Create {path} or omit --config to use discovery"),
                "Run `quorum status` to see which configuration was loaded".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for QuorumError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Adapter(_) => vec!["Run `quorum status` to check service credentials".to_string()],
            Self::Io(_) => vec!["Check that the output directory is writable".to_string()],
            Self::Json(_) => vec!["The artifact may be truncated or hand-edited".to_string()],
            Self::UnknownPhase(_) => vec![
                "Valid phases: research_validation, spec_hardening, messaging_coherence, \
                 implementation_planning, vulnerability_audit (or names from [[phases]])"
                    .to_string(),
            ],
            Self::Halted { .. } => vec![
                "Review gate_result.json for blocking issues and recommendations".to_string(),
                "Revise inputs and re-run the halted phase with --phase".to_string(),
            ],
            Self::Artifacts { .. } => vec![
                "Point --output-dir at the directory of a previous `quorum run`".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Adapter(_) => ErrorCategory::ServiceCall,
            Self::Io(_) | Self::Json(_) | Self::Artifacts { .. } => ErrorCategory::FileSystem,
            Self::UnknownPhase(_) | Self::Halted { .. } => ErrorCategory::Pipeline,
        }
    }
}
