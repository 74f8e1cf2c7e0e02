//! Result aggregation for a quorum run
//!
//! [`ResultAggregator`] keeps every task result of a run keyed by
//! (phase, task), records numeric disagreements between independently
//! produced results as [`ConflictRecord`]s, renders the synthesis report and
//! persists itself as a snapshot that later `synthesis` runs reload.

mod aggregator;
mod conflict;
pub mod flatten;
mod report;
pub mod snapshot;

pub use aggregator::{AggregateSummary, DEFAULT_CONFLICT_THRESHOLD, ResultAggregator, StoredResult};
pub use conflict::{ConflictRecord, ResultSource};
pub use report::{NEXT_STEPS, PhaseSection, SynthesisReport, TaskLine};
pub use snapshot::{AggregateSnapshot, SNAPSHOT_FILE, SNAPSHOT_VERSION};
