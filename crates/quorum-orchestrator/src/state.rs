//! State of one orchestration run

use anyhow::Result;
use chrono::Utc;
use quorum_aggregate::{AggregateSnapshot, DEFAULT_CONFLICT_THRESHOLD, ResultAggregator, SNAPSHOT_FILE};
use quorum_gate::GateHistory;
use quorum_utils::QuorumError;
use tracing::info;

use crate::manifest::{PhaseRecord, RunManifest};
use crate::output::{PersistedFile, RunOutput};

/// Result table, conflicts, gate history and manifest of a run.
///
/// Only touched between phases, after each phase's join, so it needs no
/// synchronization.
#[derive(Debug, Clone)]
pub struct RunState {
    pub aggregator: ResultAggregator,
    pub gates: GateHistory,
    pub manifest: RunManifest,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_THRESHOLD)
    }
}

impl RunState {
    #[must_use]
    pub fn new(conflict_threshold: f64) -> Self {
        Self {
            aggregator: ResultAggregator::with_threshold(conflict_threshold),
            gates: GateHistory::new(),
            manifest: RunManifest::new(Utc::now()),
        }
    }

    /// Continue the run stored under `output`, or start a new one if there
    /// is none.
    ///
    /// Stored results, conflicts, phase records and document digests carry
    /// over, so a re-run phase is compared against everything run before it.
    /// The gate history restarts; earlier gate results stay on disk.
    pub fn resume(output: &RunOutput, conflict_threshold: f64) -> Result<Self> {
        let root = output.root();
        let unavailable = |reason: String| QuorumError::Artifacts {
            dir: root.to_string(),
            reason,
        };

        let mut state = Self::new(conflict_threshold);

        let snapshot_path = root.join(SNAPSHOT_FILE);
        if snapshot_path.is_file() {
            let snapshot = AggregateSnapshot::load(&snapshot_path)
                .map_err(|e| unavailable(format!("{e:#}")))?;
            state.aggregator = ResultAggregator::from_snapshot(snapshot, conflict_threshold);
        }

        let manifest_path = output.manifest_path();
        if manifest_path.is_file() {
            let mut manifest =
                RunManifest::load(&manifest_path).map_err(|e| unavailable(format!("{e:#}")))?;
            manifest.finished_at = None;
            manifest.halted_at = None;
            state.manifest = manifest;
        }

        if !state.aggregator.is_empty() || !state.manifest.phases.is_empty() {
            info!(
                results = state.aggregator.len(),
                phases = state.manifest.phases.len(),
                "Resuming previous run"
            );
        }
        Ok(state)
    }

    pub fn record_documents(&mut self, files: impl IntoIterator<Item = PersistedFile>) {
        for file in files {
            self.manifest.documents.insert(file.relative, file.blake3);
        }
    }

    pub fn record_phase(&mut self, record: PhaseRecord) {
        self.manifest.phases.push(record);
    }
}
