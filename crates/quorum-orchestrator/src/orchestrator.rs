//! Pipeline sequencing
//!
//! Phases run strictly in catalog order. A phase that is not cleared to
//! proceed halts the run: later phases are never started and nothing already
//! persisted is rolled back. The snapshot and manifest are written however
//! the run ends; the synthesis report only when every phase proceeded.

use anyhow::Result;
use chrono::Utc;
use quorum_gate::GateResult;
use quorum_utils::QuorumError;
use tracing::{info, warn};

use crate::output::RunOutput;
use crate::phase::PhaseDescriptor;
use crate::runner::{PhaseReport, PhaseRunner};
use crate::state::RunState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every requested phase proceeded
    Completed,
    /// `phase` was not cleared to proceed
    Halted { phase: String },
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub reports: Vec<PhaseReport>,
    /// Narrative report, for full runs that completed
    pub synthesis: Option<String>,
}

impl RunSummary {
    #[must_use]
    pub fn completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Gate of the halting phase, if it had one
    #[must_use]
    pub fn halting_gate(&self) -> Option<&GateResult> {
        match &self.outcome {
            RunOutcome::Halted { phase } => self
                .reports
                .iter()
                .find(|r| &r.phase == phase)
                .and_then(|r| r.gate.as_ref()),
            RunOutcome::Completed => None,
        }
    }
}

pub struct Orchestrator<R> {
    phases: Vec<PhaseDescriptor>,
    runner: R,
    output: Option<RunOutput>,
    state: RunState,
}

impl<R: PhaseRunner> Orchestrator<R> {
    pub fn new(phases: Vec<PhaseDescriptor>, runner: R, state: RunState) -> Self {
        Self {
            phases,
            runner,
            output: None,
            state,
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: RunOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn phases(&self) -> &[PhaseDescriptor] {
        &self.phases
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Run every phase in order, stopping at the first that may not proceed
    pub async fn run_all(&mut self, pause_at_gate: bool) -> Result<RunSummary> {
        let indices: Vec<usize> = (0..self.phases.len()).collect();
        self.run_indices(&indices, pause_at_gate, true).await
    }

    /// Run exactly one named phase, gate included
    pub async fn run_one(&mut self, name: &str, pause_at_gate: bool) -> Result<RunSummary> {
        let index = self
            .phases
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| QuorumError::UnknownPhase(name.to_string()))?;
        self.run_indices(&[index], pause_at_gate, false).await
    }

    async fn run_indices(
        &mut self,
        indices: &[usize],
        pause_at_gate: bool,
        synthesize: bool,
    ) -> Result<RunSummary> {
        self.probe_services();

        let mut reports = Vec::with_capacity(indices.len());
        let mut outcome = RunOutcome::Completed;

        for &i in indices {
            let phase = &self.phases[i];
            let report = self
                .runner
                .run_phase(phase, &mut self.state, pause_at_gate)
                .await?;
            self.state.record_phase(report.record());

            let proceed = report.proceed;
            reports.push(report);
            if !proceed {
                warn!(phase = %phase.name, "Pipeline halted at gate");
                outcome = RunOutcome::Halted {
                    phase: phase.name.clone(),
                };
                break;
            }
            info!(phase = %phase.name, "Phase cleared");
        }

        let synthesis = (synthesize && outcome == RunOutcome::Completed)
            .then(|| self.state.aggregator.synthesize());
        self.finish(&outcome, synthesis.as_deref())?;

        Ok(RunSummary {
            outcome,
            reports,
            synthesis,
        })
    }

    fn probe_services(&mut self) {
        let availability = self.runner.availability();
        let unavailable: Vec<&str> = availability
            .iter()
            .filter(|(_, available)| !**available)
            .map(|(name, _)| name.as_str())
            .collect();
        if !unavailable.is_empty() {
            warn!(
                services = %unavailable.join(", "),
                "Tasks bound to these services will be skipped"
            );
        }
        self.state.manifest.services = availability;
    }

    fn finish(&mut self, outcome: &RunOutcome, synthesis: Option<&str>) -> Result<()> {
        self.state.manifest.finished_at = Some(Utc::now());
        self.state.manifest.halted_at = match outcome {
            RunOutcome::Halted { phase } => Some(phase.clone()),
            RunOutcome::Completed => None,
        };

        info!(
            results = self.state.aggregator.len(),
            conflicts = self.state.aggregator.conflicts().len(),
            gates = self.state.gates.len(),
            "Run finished"
        );

        let Some(output) = &self.output else {
            return Ok(());
        };
        if let Some(report) = synthesis {
            let file = output.write_report(report)?;
            self.state.record_documents([file]);
        }
        let snapshot = output.write_snapshot(&self.state.aggregator.snapshot())?;
        self.state.record_documents([snapshot]);
        self.state.manifest.save(&output.manifest_path())
    }
}
