//! Canonical JSON emission and content digests

use anyhow::{Context, Result};
use serde::Serialize;

/// Emit JSON using JCS (RFC 8785) for stable, byte-identical output
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).context("Failed to serialize value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .context("Failed to canonicalize JSON using JCS")?;
    String::from_utf8(json_bytes).context("JCS output contained invalid UTF-8")
}

/// Lowercase hex BLAKE3 digest of `content`
#[must_use]
pub fn blake3_hex(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
