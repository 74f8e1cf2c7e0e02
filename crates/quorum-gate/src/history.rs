//! Append-only audit trail of gate evaluations

use serde::{Deserialize, Serialize};

use crate::types::{GateResult, GateStatus};

/// Every gate evaluation of a run, in evaluation order. Entries are never
/// modified or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateHistory {
    entries: Vec<GateResult>,
}

impl GateHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an evaluation and return a reference to the stored entry
    pub fn record(&mut self, result: GateResult) -> &GateResult {
        self.entries.push(result);
        &self.entries[self.entries.len() - 1]
    }

    #[must_use]
    pub fn entries(&self) -> &[GateResult] {
        &self.entries
    }

    /// Most recent evaluation of `phase`
    #[must_use]
    pub fn latest(&self, phase: &str) -> Option<&GateResult> {
        self.entries.iter().rev().find(|g| g.phase == phase)
    }

    /// Number of evaluations that ended with `status`
    #[must_use]
    pub fn count(&self, status: GateStatus) -> usize {
        self.entries.iter().filter(|g| g.status == status).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gate(phase: &str, blocking: bool) -> GateResult {
        let issues = if blocking { vec!["x".to_string()] } else { vec![] };
        GateResult::decide(1, phase, vec![], vec![], issues, Utc::now())
    }

    #[test]
    fn test_history_keeps_every_evaluation() {
        let mut history = GateHistory::new();
        assert!(history.is_empty());

        history.record(gate("research_validation", true));
        history.record(gate("research_validation", false));
        history.record(gate("spec_hardening", false));

        assert_eq!(history.len(), 3);
        assert_eq!(history.count(GateStatus::Fail), 1);
        assert_eq!(history.count(GateStatus::Pass), 2);
        assert_eq!(
            history.latest("research_validation").unwrap().status,
            GateStatus::Pass
        );
        assert!(history.latest("vulnerability_audit").is_none());
    }

    #[test]
    fn test_history_serializes_as_list() {
        let mut history = GateHistory::new();
        history.record(gate("spec_hardening", false));

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);

        let back: GateHistory = serde_json::from_value(value).unwrap();
        assert_eq!(back, history);
    }
}
