//! quorum - phased multi-service analysis pipeline with acceptance gates
//!
//! A run walks an ordered catalog of phases. Each phase dispatches its tasks
//! to external text-generation services with bounded parallelism, joins them,
//! and checks the results against the phase's acceptance gate. A gate that
//! does not clear halts the pipeline; a full run ends with a synthesis report
//! that also lists numeric conflicts between results.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! quorum status              # which services have credentials
//! quorum estimate            # static cost of a full run
//! quorum run --pause-at-gate # run every phase, confirming at each gate
//! quorum synthesis --format structured
//! ```
//!
//! # Crates
//!
//! - `quorum-utils`: task result envelope, errors, extraction, JCS, logging
//! - `quorum-config`: configuration discovery and credentials
//! - `quorum-llm`: service adapters and the adapter registry
//! - `quorum-prompt-template`: prompt templates
//! - `quorum-gate`: gate criteria and decision policy
//! - `quorum-aggregate`: result table, conflict detection, synthesis
//! - `quorum-orchestrator`: phase execution and sequencing
//!
//! The types re-exported here are the supported library surface.

pub mod cli;
pub mod exit_codes;

pub use exit_codes::ExitCode;

pub use quorum_aggregate::{ConflictRecord, ResultAggregator, SynthesisReport};
pub use quorum_config::{CliArgs, Config};
pub use quorum_gate::{GateResult, GateStatus, GateValidator};
pub use quorum_llm::{AdapterRegistry, ServiceAdapter};
pub use quorum_orchestrator::{
    Orchestrator, PhaseDescriptor, PhaseExecutor, PhaseRunner, RunOutcome, RunSummary,
    default_phases,
};
pub use quorum_prompt_template::{FilePromptProvider, PromptProvider};
pub use quorum_utils::canonicalization::emit_jcs;
pub use quorum_utils::{QuorumError, TaskResult, TaskStatus};
