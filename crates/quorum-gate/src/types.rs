//! Gate result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    /// Every criterion holds and nothing blocks
    Pass,
    /// Some soft criterion is unmet
    Revise,
    /// At least one blocking issue
    Fail,
}

impl GateStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Revise => "revise",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an unmet criterion affects the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unmet → recommendation, gate at best `revise`
    Soft,
    /// Unmet → blocking issue, gate `fail`
    Hard,
}

/// Individual condition evaluated by a gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCondition {
    pub name: String,
    /// What the condition checks
    pub description: String,
    pub severity: Severity,
    pub passed: bool,
    /// Value observed in the phase results
    pub actual: Option<String>,
    /// Value required to pass
    pub expected: Option<String>,
}

/// Result of one gate evaluation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Ordinal of the gated phase
    pub gate_number: usize,
    pub phase: String,
    /// `status == pass`
    pub passed: bool,
    pub status: GateStatus,
    /// Criterion name → whether it held
    pub criteria: BTreeMap<String, bool>,
    pub conditions: Vec<GateCondition>,
    pub recommendations: Vec<String>,
    pub blocking_issues: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl GateResult {
    /// Apply the decision policy to evaluated conditions.
    ///
    /// `fail` whenever `blocking_issues` is non-empty; `pass` only when every
    /// criterion holds and nothing blocks; `revise` otherwise.
    #[must_use]
    pub fn decide(
        gate_number: usize,
        phase: impl Into<String>,
        conditions: Vec<GateCondition>,
        recommendations: Vec<String>,
        blocking_issues: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let criteria: BTreeMap<String, bool> = conditions
            .iter()
            .map(|c| (c.name.clone(), c.passed))
            .collect();

        let status = if !blocking_issues.is_empty() {
            GateStatus::Fail
        } else if criteria.values().all(|&held| held) {
            GateStatus::Pass
        } else {
            GateStatus::Revise
        };

        Self {
            gate_number,
            phase: phase.into(),
            passed: status == GateStatus::Pass,
            status,
            criteria,
            conditions,
            recommendations,
            blocking_issues,
            timestamp,
        }
    }

    /// One-line human summary
    #[must_use]
    pub fn summary(&self) -> String {
        let held = self.criteria.values().filter(|&&v| v).count();
        format!(
            "Gate {} ({}): {} ({}/{} criteria met, {} blocking)",
            self.gate_number,
            self.phase,
            self.status,
            held,
            self.criteria.len(),
            self.blocking_issues.len()
        )
    }
}
