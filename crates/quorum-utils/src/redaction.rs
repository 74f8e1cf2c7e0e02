//! Credential scrubbing for error messages
//!
//! Backend errors can echo request URLs (Gemini passes its key as a query
//! parameter) or auth headers. Everything that ends up in a log line or a
//! persisted `TaskResult` goes through [`redact_error_message`] first.

use once_cell::sync::Lazy;
use regex::Regex;

/// URLs with embedded userinfo
static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s/]+:[^@\s/]+@").unwrap());

/// `key=...` / `api_key=...` query parameters
static QUERY_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([?&](?:api_)?key=)[^&\s]+").unwrap());

/// `Bearer <token>` and `x-api-key: <token>` header echoes
static AUTH_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(bearer\s+|x-api-key[:=]\s*|x-goog-api-key[:=]\s*)[A-Za-z0-9._~+/=-]+")
        .unwrap()
});

/// Long opaque tokens (32+ key-ish characters)
static POTENTIAL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}([^A-Za-z0-9_-]|$)").unwrap()
});

/// Remove credentials from a message while keeping enough context to debug
#[must_use]
pub fn redact_error_message(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = QUERY_KEY.replace_all(&redacted, "$1[REDACTED]");
    let redacted = AUTH_HEADER.replace_all(&redacted, "$1[REDACTED]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, "$1[REDACTED_KEY]$2");
    redacted.into_owned()
}
