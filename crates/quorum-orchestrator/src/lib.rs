//! Phase orchestration for quorum
//!
//! A run walks the phase catalog in order. Each phase fans its tasks out to
//! service adapters with at most `parallel_limit` in flight, joins them,
//! forwards the results to the aggregator and then evaluates the phase gate.
//! A gate that does not clear halts the pipeline.

pub mod decision;
mod executor;
pub mod manifest;
mod orchestrator;
pub mod output;
pub mod phase;
mod runner;
mod state;

pub use decision::{DialoguerDecider, FixedDecider, GateDecider, HumanDecision, proceeds};
pub use executor::PhaseExecutor;
pub use manifest::{MANIFEST_VERSION, PhaseOutcome, PhaseRecord, RunManifest};
pub use orchestrator::{Orchestrator, RunOutcome, RunSummary};
pub use output::{PersistedFile, RunOutput};
pub use phase::{PhaseDescriptor, default_phases, phase_catalog, task_counts};
pub use runner::{PhaseReport, PhaseRunner};
pub use state::RunState;
