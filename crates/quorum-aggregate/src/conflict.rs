//! Conflict records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a stored result came from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultSource {
    pub phase: String,
    pub task: String,
}

impl ResultSource {
    #[must_use]
    pub fn new(phase: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            task: task.into(),
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.phase, self.task)
    }
}

/// Two stored results disagreeing on the same numeric path.
///
/// `source1` is the result that was already stored, `source2` the one whose
/// insertion revealed the disagreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub path: String,
    pub value1: f64,
    pub source1: ResultSource,
    pub value2: f64,
    pub source2: ResultSource,
    /// Relative difference, in percent
    pub difference_percent: f64,
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}`: {} ({}) vs {} ({}), {:.1}% apart",
            self.path,
            self.value1,
            self.source1,
            self.value2,
            self.source2,
            self.difference_percent
        )
    }
}
