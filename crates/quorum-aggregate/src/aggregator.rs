//! Run-wide result table with conflict detection

use quorum_utils::{TaskResult, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::conflict::{ConflictRecord, ResultSource};
use crate::flatten::{NumericPaths, flatten_numeric, relative_difference};

/// Relative difference above which two values conflict
pub const DEFAULT_CONFLICT_THRESHOLD: f64 = 0.20;

/// A task result as stored by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub phase: String,
    pub task: String,
    pub result: TaskResult,
}

impl StoredResult {
    #[must_use]
    pub fn source(&self) -> ResultSource {
        ResultSource::new(&self.phase, &self.task)
    }

    fn numeric_paths(&self) -> NumericPaths {
        self.result
            .structured_data
            .as_ref()
            .map(flatten_numeric)
            .unwrap_or_default()
    }
}

/// Counts over the current table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_results: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Phase name → number of stored results
    pub by_phase: BTreeMap<String, usize>,
    pub conflicts: usize,
}

/// Accumulates every task result of a run, keyed by (phase, task).
///
/// Each insertion is compared against every other stored result on shared
/// numeric paths, regardless of the phase or task they came from. Conflicts
/// only ever accumulate: replacing a result never retracts an earlier record.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    threshold: f64,
    entries: Vec<StoredResult>,
    // Parallel to `entries`; filled on first comparison
    flattened: Vec<Option<NumericPaths>>,
    conflicts: Vec<ConflictRecord>,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_CONFLICT_THRESHOLD)
    }
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            entries: Vec::new(),
            flattened: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Rebuild from previously persisted state without re-running detection
    #[must_use]
    pub fn restore(
        threshold: f64,
        entries: Vec<StoredResult>,
        conflicts: Vec<ConflictRecord>,
    ) -> Self {
        let flattened = vec![None; entries.len()];
        Self {
            threshold,
            entries,
            flattened,
            conflicts,
        }
    }

    /// Store `result` under (phase, task), replacing any previous entry, and
    /// return the conflicts this insertion revealed.
    pub fn add_result(
        &mut self,
        phase: impl Into<String>,
        task: impl Into<String>,
        result: TaskResult,
    ) -> &[ConflictRecord] {
        let stored = StoredResult {
            phase: phase.into(),
            task: task.into(),
            result,
        };
        let new_paths = stored.numeric_paths();
        let source = stored.source();

        let index = match self.position(&stored.phase, &stored.task) {
            Some(i) => {
                debug!(phase = %stored.phase, task = %stored.task, "Replacing stored result");
                self.entries[i] = stored;
                i
            }
            None => {
                self.entries.push(stored);
                self.flattened.push(None);
                self.entries.len() - 1
            }
        };

        let before = self.conflicts.len();
        if !new_paths.is_empty() {
            self.flatten_all_except(index);
            let found = self.compare(index, &source, &new_paths);
            for conflict in &found {
                warn!(
                    path = %conflict.path,
                    source1 = %conflict.source1,
                    source2 = %conflict.source2,
                    difference_percent = conflict.difference_percent,
                    "Numeric conflict detected"
                );
            }
            self.conflicts.extend(found);
        }
        self.flattened[index] = Some(new_paths);

        &self.conflicts[before..]
    }

    fn position(&self, phase: &str, task: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.phase == phase && e.task == task)
    }

    fn flatten_all_except(&mut self, index: usize) {
        for (i, (entry, cached)) in self.entries.iter().zip(self.flattened.iter_mut()).enumerate() {
            if i != index && cached.is_none() {
                *cached = Some(entry.numeric_paths());
            }
        }
    }

    fn compare(
        &self,
        index: usize,
        source: &ResultSource,
        new_paths: &NumericPaths,
    ) -> Vec<ConflictRecord> {
        let mut found = Vec::new();
        for (i, (entry, cached)) in self.entries.iter().zip(&self.flattened).enumerate() {
            let Some(existing) = cached.as_ref().filter(|_| i != index) else {
                continue;
            };
            for (path, &value2) in new_paths {
                let Some(&value1) = existing.get(path) else {
                    continue;
                };
                if let Some(rel) = relative_difference(value1, value2)
                    && rel > self.threshold
                {
                    found.push(ConflictRecord {
                        path: path.clone(),
                        value1,
                        source1: entry.source(),
                        value2,
                        source2: source.clone(),
                        difference_percent: rel * 100.0,
                    });
                }
            }
        }
        found
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Stored results in insertion order
    #[must_use]
    pub fn results(&self) -> &[StoredResult] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, phase: &str, task: &str) -> Option<&TaskResult> {
        self.position(phase, task).map(|i| &self.entries[i].result)
    }

    /// Phase names in order of first appearance
    #[must_use]
    pub fn phases(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.phase.as_str()) {
                seen.push(&entry.phase);
            }
        }
        seen
    }

    pub fn phase_results<'a>(&'a self, phase: &'a str) -> impl Iterator<Item = &'a StoredResult> {
        self.entries.iter().filter(move |e| e.phase == phase)
    }

    #[must_use]
    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> AggregateSummary {
        let mut summary = AggregateSummary {
            total_results: self.entries.len(),
            conflicts: self.conflicts.len(),
            ..AggregateSummary::default()
        };
        for entry in &self.entries {
            match entry.result.status {
                TaskStatus::Success => summary.succeeded += 1,
                TaskStatus::Error => summary.failed += 1,
            }
            *summary.by_phase.entry(entry.phase.clone()).or_default() += 1;
        }
        summary
    }
}
