//! Uniform criterion engine
//!
//! The validator picks a phase's criteria, evaluates each against the full
//! set of task results, sorts unmet criteria into recommendations (soft) or
//! blocking issues (hard) and applies the decision policy.

use chrono::{DateTime, Utc};
use quorum_utils::TaskResult;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::criteria::{Criterion, PhaseEvidence};
use crate::rules::rules_for;
use crate::types::{GateCondition, GateResult, GateStatus, Severity};

#[derive(Debug, Clone, Default)]
pub struct GateValidator {
    custom: BTreeMap<String, Vec<Criterion>>,
}

impl GateValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare criteria for a phase, replacing the built-in set for that name
    pub fn register(&mut self, phase: impl Into<String>, criteria: Vec<Criterion>) {
        self.custom.insert(phase.into(), criteria);
    }

    /// Criteria that apply to `phase`
    #[must_use]
    pub fn criteria_for(&self, phase: &str) -> &[Criterion] {
        self.custom
            .get(phase)
            .map_or_else(|| rules_for(phase), Vec::as_slice)
    }

    /// Evaluate `phase`'s gate against every result of the phase
    #[must_use]
    pub fn evaluate(&self, phase: &str, gate_number: usize, results: &[TaskResult]) -> GateResult {
        self.evaluate_at(phase, gate_number, results, Utc::now())
    }

    #[must_use]
    pub fn evaluate_at(
        &self,
        phase: &str,
        gate_number: usize,
        results: &[TaskResult],
        timestamp: DateTime<Utc>,
    ) -> GateResult {
        let evidence = PhaseEvidence::new(results);
        let criteria = self.criteria_for(phase);

        let mut conditions = Vec::with_capacity(criteria.len());
        let mut recommendations = Vec::new();
        let mut blocking_issues = Vec::new();

        for criterion in criteria {
            let condition = criterion.evaluate(&evidence);
            debug!(
                phase = phase,
                criterion = criterion.name,
                passed = condition.passed,
                actual = condition.actual.as_deref().unwrap_or(""),
                "Gate criterion evaluated"
            );
            if !condition.passed {
                match criterion.severity {
                    Severity::Hard => blocking_issues.push(blocking_issue(&condition)),
                    Severity::Soft => recommendations.push(recommendation(criterion, &condition)),
                }
            }
            conditions.push(condition);
        }

        let result = GateResult::decide(
            gate_number,
            phase,
            conditions,
            recommendations,
            blocking_issues,
            timestamp,
        );

        match result.status {
            GateStatus::Pass => info!(phase = phase, gate = gate_number, "Gate passed"),
            GateStatus::Revise => info!(
                phase = phase,
                gate = gate_number,
                recommendations = result.recommendations.len(),
                "Gate requests revision"
            ),
            GateStatus::Fail => warn!(
                phase = phase,
                gate = gate_number,
                blocking = result.blocking_issues.len(),
                "Gate failed"
            ),
        }
        result
    }
}

fn blocking_issue(condition: &GateCondition) -> String {
    match &condition.actual {
        Some(actual) => format!("{} ({actual})", condition.description),
        None => condition.description.clone(),
    }
}

fn recommendation(criterion: &Criterion, condition: &GateCondition) -> String {
    match (&condition.actual, &condition.expected) {
        (Some(actual), Some(expected)) => {
            format!("{}: {actual}, need {expected}", criterion.remedy)
        }
        _ => criterion.remedy.to_string(),
    }
}
