//! Criterion records and the evidence they inspect
//!
//! A criterion is a named predicate over a phase's task results. Criteria never
//! look at raw provider output directly: they go through [`PhaseEvidence`],
//! which searches the structured documents extracted from successful results.

use quorum_utils::TaskResult;
use serde_json::Value;

use crate::types::{GateCondition, Severity};

/// Outcome of one criterion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionCheck {
    pub passed: bool,
    pub actual: Option<String>,
    pub expected: Option<String>,
}

impl CriterionCheck {
    #[must_use]
    pub fn new(passed: bool, actual: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            passed,
            actual: Some(actual.into()),
            expected: Some(expected.into()),
        }
    }

    /// Failed check for a key absent from every result
    #[must_use]
    pub fn missing(key: &str, expected: impl Into<String>) -> Self {
        Self {
            passed: false,
            actual: Some(format!("no `{key}` in phase results")),
            expected: Some(expected.into()),
        }
    }
}

/// A named, independently testable gate predicate
#[derive(Debug, Clone, Copy)]
pub struct Criterion {
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    /// Advice surfaced when the criterion is unmet
    pub remedy: &'static str,
    pub check: fn(&PhaseEvidence<'_>) -> CriterionCheck,
}

impl Criterion {
    /// Run the predicate and record the outcome as a condition
    #[must_use]
    pub fn evaluate(&self, evidence: &PhaseEvidence<'_>) -> GateCondition {
        let check = (self.check)(evidence);
        GateCondition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            severity: self.severity,
            passed: check.passed,
            actual: check.actual,
            expected: check.expected,
        }
    }
}

/// Read-only view over one phase's task results
#[derive(Debug, Clone, Copy)]
pub struct PhaseEvidence<'a> {
    results: &'a [TaskResult],
}

impl<'a> PhaseEvidence<'a> {
    #[must_use]
    pub fn new(results: &'a [TaskResult]) -> Self {
        Self { results }
    }

    #[must_use]
    pub fn results(&self) -> &'a [TaskResult] {
        self.results
    }

    /// Result for `task`, if it ran
    #[must_use]
    pub fn task(&self, task: &str) -> Option<&'a TaskResult> {
        self.results.iter().find(|r| r.task == task)
    }

    #[must_use]
    pub fn task_succeeded(&self, task: &str) -> bool {
        self.task(task).is_some_and(TaskResult::is_success)
    }

    /// First value stored under `key`, searching every successful result's
    /// structured data recursively, in task order
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&'a Value> {
        self.results
            .iter()
            .filter(|r| r.is_success())
            .filter_map(|r| r.structured_data.as_ref())
            .find_map(|doc| find_key(doc, key))
    }

    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.find(key).and_then(as_number)
    }

    #[must_use]
    pub fn array(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.find(key).and_then(Value::as_array)
    }
}

/// Depth-first key search: a key at the current level wins over nested ones
pub(crate) fn find_key<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Numbers, numeric strings and percentages like `"22%"`
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// Whether a value carries anything worth reporting
pub(crate) fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
