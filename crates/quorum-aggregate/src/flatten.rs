//! Numeric path flattening
//!
//! Nested documents are reduced to `path → number` pairs. Object keys are
//! joined with `.`, sequence positions are written `[i]`:
//! `{"cost": {"items": [{"usd": 5}]}}` yields `cost.items[0].usd → 5`.

use serde_json::Value;
use std::collections::BTreeMap;

pub type NumericPaths = BTreeMap<String, f64>;

/// Every numeric leaf of `value`, keyed by its path
#[must_use]
pub fn flatten_numeric(value: &Value) -> NumericPaths {
    let mut out = NumericPaths::new();
    walk(value, String::new(), &mut out);
    out
}

fn walk(value: &Value, path: String, out: &mut NumericPaths) {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                out.insert(path, v);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, child_path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{path}[{i}]"), out);
            }
        }
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}

/// `|a - b| / mean(|a|, |b|)`, or `None` when both are zero
#[must_use]
pub fn relative_difference(a: f64, b: f64) -> Option<f64> {
    let mean = (a.abs() + b.abs()) / 2.0;
    if mean == 0.0 {
        return None;
    }
    Some((a - b).abs() / mean)
}
