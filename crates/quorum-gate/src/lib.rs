//! Phase acceptance gates
//!
//! After a phase's tasks have all been joined, its results are checked against
//! the phase's criteria. Each criterion is a record with a name, a severity and
//! a predicate; one engine evaluates them uniformly:
//!
//! - an unmet **hard** criterion becomes a blocking issue and forces `fail`
//! - an unmet **soft** criterion becomes a recommendation and yields `revise`
//! - everything met yields `pass`

pub mod criteria;
pub mod history;
pub mod json;
pub mod rules;
pub mod types;
pub mod validator;

pub use criteria::{Criterion, CriterionCheck, PhaseEvidence};
pub use history::GateHistory;
pub use json::emit_gate_json;
pub use rules::rules_for;
pub use types::{GateCondition, GateResult, GateStatus, Severity};
pub use validator::GateValidator;
