//! Best-effort structured-data extraction from free-text model output
//!
//! Models are asked to close with a fenced json block, but they do not always
//! comply. Extraction tries the fenced blocks first, then the balanced `{...}`
//! spans in order of where they start. Failure is not an error: the caller
//! simply records no structured data.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A ``` fence: info string on the opening line, body up to the next fence
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```([^`\n]*)\n(.*?)```").unwrap());

/// Extract a nested JSON document from `text`.
///
/// Returns non-empty objects and arrays only. Scalars and empty containers
/// are not considered structured data.
#[must_use]
pub fn extract_structured_data(text: &str) -> Option<Value> {
    fenced_blocks(text)
        .into_iter()
        .find_map(parse_document)
        .or_else(|| scan_braces(text))
}

fn parse_document(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map)),
        Ok(Value::Array(items)) if !items.is_empty() => Some(Value::Array(items)),
        _ => None,
    }
}

/// Bodies of ``` fenced blocks, `json`-tagged blocks first
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut tagged = Vec::new();
    let mut untagged = Vec::new();

    for caps in FENCE.captures_iter(text) {
        let (Some(info), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        match info.as_str().trim().to_ascii_lowercase().as_str() {
            "json" | "jsonc" => tagged.push(body.as_str()),
            "" => untagged.push(body.as_str()),
            _ => {}
        }
    }

    tagged.extend(untagged);
    tagged
}

/// First balanced span, by start offset, that parses as a document
fn scan_braces(text: &str) -> Option<Value> {
    let mut spans = balanced_spans(text.as_bytes());
    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .find_map(|(start, end)| parse_document(&text[start..=end]))
}

/// Every balanced `{...}` span, found in a single pass.
///
/// Quotes only open a string inside a brace, and a raw newline ends one,
/// since JSON strings cannot contain it.
fn balanced_spans(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' | b'\n' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_block() {
        let text = "Analysis follows.\n\n```json\n{\"total_claims\": 10, \"confirmed\": 9}\n```\nDone.";
        assert_eq!(
            extract_structured_data(text),
            Some(json!({"total_claims": 10, "confirmed": 9}))
        );
    }

    #[test]
    fn test_tagged_block_preferred_over_untagged() {
        let text = "```\n{\"a\": 1}\n```\n\n```json\n{\"b\": 2}\n```\n";
        assert_eq!(extract_structured_data(text), Some(json!({"b": 2})));
    }

    #[test]
    fn test_fenced_array() {
        let text = "```json\n[{\"ms\": 20}, {\"ms\": 30}]\n```";
        assert_eq!(
            extract_structured_data(text),
            Some(json!([{"ms": 20}, {"ms": 30}]))
        );
    }

    #[test]
    fn test_other_language_fence_ignored() {
        let text = "```rust\nfn main() {}\n```\nResult: {\"ok\": true}";
        assert_eq!(extract_structured_data(text), Some(json!({"ok": true})));
    }

    #[test]
    fn test_raw_brace_scan_handles_braces_in_strings() {
        let text = r#"Summary: {"note": "use {placeholders} carefully", "n": 3} trailing"#;
        assert_eq!(
            extract_structured_data(text),
            Some(json!({"note": "use {placeholders} carefully", "n": 3}))
        );
    }

    #[test]
    fn test_skips_unparseable_candidate() {
        let text = "Set {x} aside. Data: {\"cost\": {\"total\": 1000}}";
        assert_eq!(
            extract_structured_data(text),
            Some(json!({"cost": {"total": 1000}}))
        );
    }

    #[test]
    fn test_invalid_fence_falls_back_to_scan() {
        let text = "```json\n{not json}\n```\n{\"fallback\": 1}";
        assert_eq!(extract_structured_data(text), Some(json!({"fallback": 1})));
    }

    #[test]
    fn test_no_structure() {
        assert_eq!(extract_structured_data("plain prose only"), None);
        assert_eq!(extract_structured_data("{ unbalanced"), None);
        assert_eq!(extract_structured_data(""), None);
    }

    #[test]
    fn test_unclosed_brace_before_document() {
        let text = "Set {x aside for now. Data: {\"cost\": {\"total\": 1000}}";
        assert_eq!(
            extract_structured_data(text),
            Some(json!({"cost": {"total": 1000}}))
        );
    }

    #[test]
    fn test_fence_with_crlf_and_padded_tag() {
        let text = "``` JSON \r\n{\"n\": 1}\r\n```";
        assert_eq!(extract_structured_data(text), Some(json!({"n": 1})));
    }

    #[test]
    fn test_many_unbalanced_braces() {
        let text = format!("{}{{\"ok\": true}}", "{ ".repeat(50_000));
        assert_eq!(extract_structured_data(&text), Some(json!({"ok": true})));
        assert_eq!(extract_structured_data(&"{".repeat(100_000)), None);
    }
}
