//! Durable aggregator snapshots (`aggregated_results.json`)

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use quorum_utils::atomic_write::write_file_atomic;
use quorum_utils::canonicalization::emit_jcs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{AggregateSummary, ResultAggregator, StoredResult};
use crate::conflict::ConflictRecord;

pub const SNAPSHOT_FILE: &str = "aggregated_results.json";
pub const SNAPSHOT_VERSION: u32 = 1;

/// Result table, conflict list and computed summary at one point in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    /// Stored results in insertion order
    pub results: Vec<StoredResult>,
    pub conflicts: Vec<ConflictRecord>,
    pub summary: AggregateSummary,
}

impl AggregateSnapshot {
    /// Write as canonical JSON, atomically
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let json = emit_jcs(self).context("Failed to serialize aggregate snapshot")?;
        write_file_atomic(path, &json)
            .with_context(|| format!("Failed to write snapshot: {path}"))?;
        debug!(path = %path, results = self.results.len(), "Saved aggregate snapshot");
        Ok(())
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {path}"))?;
        let snapshot: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {path}"))?;
        if snapshot.version != SNAPSHOT_VERSION {
            bail!(
                "Unsupported snapshot version {} in {path} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            );
        }
        Ok(snapshot)
    }
}

impl ResultAggregator {
    #[must_use]
    pub fn snapshot(&self) -> AggregateSnapshot {
        self.snapshot_at(Utc::now())
    }

    #[must_use]
    pub fn snapshot_at(&self, saved_at: DateTime<Utc>) -> AggregateSnapshot {
        AggregateSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at,
            results: self.results().to_vec(),
            conflicts: self.conflicts().to_vec(),
            summary: self.summary(),
        }
    }

    /// Restore table and conflicts as saved; detection is not re-run
    #[must_use]
    pub fn from_snapshot(snapshot: AggregateSnapshot, threshold: f64) -> Self {
        Self::restore(threshold, snapshot.results, snapshot.conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use quorum_utils::{TaskMetadata, TaskResult};
    use serde_json::json;
    use tempfile::TempDir;

    fn aggregator() -> ResultAggregator {
        let mut agg = ResultAggregator::new();
        for (task, total) in [("a", 1000), ("b", 1300)] {
            agg.add_result(
                "implementation_planning",
                task,
                TaskResult::success(
                    task,
                    "openai",
                    "text",
                    Some(json!({"cost": {"total": total}})),
                    TaskMetadata::default(),
                ),
            );
        }
        agg
    }

    fn snapshot_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(SNAPSHOT_FILE)).unwrap()
    }

    #[test]
    fn test_save_and_load_restores_state() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);
        let agg = aggregator();

        agg.snapshot().save(&path).unwrap();
        let loaded = AggregateSnapshot::load(&path).unwrap();

        assert_eq!(loaded.summary.total_results, 2);
        assert_eq!(loaded.summary.conflicts, 1);

        let restored = ResultAggregator::from_snapshot(loaded, agg.threshold());
        assert_eq!(restored.results(), agg.results());
        assert_eq!(restored.conflicts(), agg.conflicts());
        assert_eq!(restored.synthesize(), agg.synthesize());
    }

    #[test]
    fn test_restored_aggregator_keeps_detecting() {
        let mut restored = ResultAggregator::from_snapshot(aggregator().snapshot(), 0.20);
        let found = restored
            .add_result(
                "vulnerability_audit",
                "c",
                TaskResult::success("c", "grok", "t", Some(json!({"cost": {"total": 1000}})), TaskMetadata::default()),
            )
            .len();
        // Against b (1300); a agrees
        assert_eq!(found, 1);
        assert_eq!(restored.conflicts().len(), 2);
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);
        let mut snapshot = aggregator().snapshot();
        snapshot.version = 99;
        snapshot.save(&path).unwrap();

        let err = AggregateSnapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported snapshot version 99"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(AggregateSnapshot::load(&snapshot_path(&dir)).is_err());
    }
}
