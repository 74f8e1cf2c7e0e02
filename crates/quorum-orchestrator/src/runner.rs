//! The seam between the orchestrator and phase execution

use anyhow::Result;
use async_trait::async_trait;
use quorum_gate::GateResult;
use quorum_utils::TaskResult;
use std::collections::BTreeMap;

use crate::decision::HumanDecision;
use crate::manifest::{PhaseOutcome, PhaseRecord};
use crate::phase::PhaseDescriptor;
use crate::state::RunState;

/// What running one phase produced
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub phase: String,
    pub ordinal: usize,
    /// Cleared to advance to the next phase
    pub proceed: bool,
    pub gate: Option<GateResult>,
    pub decision: Option<HumanDecision>,
    /// Results of dispatched tasks, in declaration order
    pub results: Vec<TaskResult>,
    /// Tasks not attempted (service unavailable or unbound)
    pub skipped: Vec<String>,
}

impl PhaseReport {
    #[must_use]
    pub fn record(&self) -> PhaseRecord {
        PhaseRecord {
            phase: self.phase.clone(),
            ordinal: self.ordinal,
            outcome: if self.proceed {
                PhaseOutcome::Proceeded
            } else {
                PhaseOutcome::Halted
            },
            gate_status: self.gate.as_ref().map(|g| g.status),
            decision: self.decision,
            tasks_run: self.results.len(),
            tasks_failed: self.results.iter().filter(|r| !r.is_success()).count(),
            tasks_skipped: self.skipped.clone(),
        }
    }
}

#[async_trait]
pub trait PhaseRunner: Send + Sync {
    /// Service name → availability, probed before the first phase
    fn availability(&self) -> BTreeMap<String, bool> {
        BTreeMap::new()
    }

    /// Run every task of `phase`, join them, and evaluate the gate.
    ///
    /// Task failures are reported inside the returned results; an `Err` is
    /// reserved for failures of the run itself (output cannot be written,
    /// the gate prompt cannot be shown).
    async fn run_phase(
        &self,
        phase: &PhaseDescriptor,
        state: &mut RunState,
        pause_at_gate: bool,
    ) -> Result<PhaseReport>;
}
