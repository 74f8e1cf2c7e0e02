//! Shared HTTP plumbing for the network backends
//!
//! Each backend owns one [`HttpClient`], whose `reqwest::Client` is built on
//! first use and reused for every later call. Retry is not done here: one call
//! is one attempt, and the adapter decides whether to try again.

use once_cell::sync::OnceCell;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use quorum_utils::AdapterError;
use quorum_utils::redaction::redact_error_message;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest provider error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Default)]
pub(crate) struct HttpClient {
    client: OnceCell<Client>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying client, created on first call
    pub fn client(&self) -> Result<&Client, AdapterError> {
        self.client.get_or_try_init(|| {
            Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .map_err(|e| {
                    AdapterError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
                })
        })
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }

    /// Send one request and decode a JSON success body into `T`
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<T, AdapterError> {
        debug!(
            provider = provider,
            timeout_secs = timeout.as_secs(),
            "Sending HTTP request"
        );

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, timeout, provider))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&e, timeout, provider))?;

        if !status.is_success() {
            return Err(map_status(status, provider, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            AdapterError::MalformedResponse(format!("{provider} returned undecodable body: {e}"))
        })
    }
}

fn map_reqwest_error(err: &reqwest::Error, timeout: Duration, provider: &str) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout { duration: timeout }
    } else if err.is_decode() {
        AdapterError::MalformedResponse(format!(
            "{provider} response could not be read: {}",
            redact_error_message(&err.to_string())
        ))
    } else {
        AdapterError::Transport(format!(
            "{provider} request failed: {}",
            redact_error_message(&err.to_string())
        ))
    }
}

/// Map a non-success status to an error kind
///
/// - 401/403 → `ProviderAuth`
/// - 429 → `ProviderQuota`
/// - 5xx → `ProviderOutage`
/// - other → `ProviderRejected` (bad request, content-safety block, ...)
pub(crate) fn map_status(status: StatusCode, provider: &str, body: &str) -> AdapterError {
    let detail = summarize_body(body);
    let suffix = if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AdapterError::ProviderAuth(format!("{provider} authentication failed ({status}){suffix}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AdapterError::ProviderQuota(format!("{provider} rate limit exceeded ({status}){suffix}"))
        }
        s if s.is_server_error() => {
            AdapterError::ProviderOutage(format!("{provider} returned server error ({status}){suffix}"))
        }
        s => AdapterError::ProviderRejected {
            status: s.as_u16(),
            message: format!("{provider}{suffix}"),
        },
    }
}

fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    let short: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    redact_error_message(&short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_lazy_and_reused() {
        let http = HttpClient::new();
        assert!(!http.is_initialized());

        let first = http.client().unwrap() as *const Client;
        let second = http.client().unwrap() as *const Client;

        assert!(http.is_initialized());
        assert_eq!(first, second);
    }

    #[test]
    fn test_auth_statuses() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            assert!(matches!(
                map_status(status, "openai", ""),
                AdapterError::ProviderAuth(_)
            ));
        }
    }

    #[test]
    fn test_rate_limit_status() {
        let err = map_status(StatusCode::TOO_MANY_REQUESTS, "grok", "slow down");
        match err {
            AdapterError::ProviderQuota(msg) => {
                assert!(msg.contains("grok"));
                assert!(msg.contains("slow down"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_server_error_is_outage() {
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "gemini", "<html>"),
            AdapterError::ProviderOutage(_)
        ));
    }

    #[test]
    fn test_other_client_errors_are_rejections() {
        let err = map_status(StatusCode::BAD_REQUEST, "claude", "{\"error\":\"blocked\"}");
        assert_eq!(
            err,
            AdapterError::ProviderRejected {
                status: 400,
                message: "claude: {\"error\":\"blocked\"}".to_string()
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_body_is_truncated_and_redacted() {
        let key = "k".repeat(40);
        let body = format!("invalid key {key} {}", "x".repeat(1000));
        let err = map_status(StatusCode::UNAUTHORIZED, "perplexity", &body);
        let msg = err.to_string();
        assert!(!msg.contains(&key));
        assert!(msg.len() < 500);
    }
}
