//! Run output tree
//!
//! ```text
//! <root>/
//!   <phase>/<task>.json       full TaskResult
//!   <phase>/<task>.md         raw content, when present
//!   <phase>/gate_result.json  canonical JSON gate result
//!   aggregated_results.json   aggregator snapshot
//!   synthesis_report.md       narrative report (full runs)
//!   run_manifest.json         outcomes and document digests
//! ```

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use quorum_aggregate::{AggregateSnapshot, SNAPSHOT_FILE};
use quorum_gate::{GateResult, emit_gate_json};
use quorum_utils::TaskResult;
use quorum_utils::atomic_write::{is_single_component, write_file_atomic, write_json_atomic};
use quorum_utils::canonicalization::blake3_hex;

pub const GATE_FILE: &str = "gate_result.json";
pub const REPORT_FILE: &str = "synthesis_report.md";
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// A document written under the run root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFile {
    /// Path relative to the run root, `/`-separated
    pub relative: String,
    pub blake3: String,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    root: Utf8PathBuf,
}

impl RunOutput {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Persist a task result, plus its content when there is any
    pub fn write_task(&self, phase: &str, result: &TaskResult) -> Result<Vec<PersistedFile>> {
        let phase = path_component(phase)?;
        let task = path_component(&result.task)?;

        let json_rel = format!("{phase}/{task}.json");
        let json_path = self.root.join(&json_rel);
        write_json_atomic(&json_path, result)
            .with_context(|| format!("Failed to persist result for {phase}/{task}"))?;
        let mut written = vec![self.digest(json_rel)?];

        if let Some(content) = result.content.as_deref().filter(|c| !c.trim().is_empty()) {
            let md_rel = format!("{phase}/{task}.md");
            write_file_atomic(&self.root.join(&md_rel), content)
                .with_context(|| format!("Failed to persist content for {phase}/{task}"))?;
            written.push(self.digest(md_rel)?);
        }
        Ok(written)
    }

    pub fn write_gate(&self, gate: &GateResult) -> Result<PersistedFile> {
        let phase = path_component(&gate.phase)?;
        let rel = format!("{phase}/{GATE_FILE}");
        let json = emit_gate_json(gate)?;
        write_file_atomic(&self.root.join(&rel), &json)?;
        self.digest(rel)
    }

    pub fn write_report(&self, report: &str) -> Result<PersistedFile> {
        write_file_atomic(&self.root.join(REPORT_FILE), report)
            .context("Failed to write synthesis report")?;
        self.digest(REPORT_FILE.to_string())
    }

    pub fn write_snapshot(&self, snapshot: &AggregateSnapshot) -> Result<PersistedFile> {
        snapshot.save(&self.root.join(SNAPSHOT_FILE))?;
        self.digest(SNAPSHOT_FILE.to_string())
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn digest(&self, relative: String) -> Result<PersistedFile> {
        let path = self.root.join(&relative);
        let bytes = std::fs::read(&path).with_context(|| format!("Failed to read back {path}"))?;
        Ok(PersistedFile {
            relative,
            blake3: blake3_hex(&bytes),
        })
    }
}

/// A phase or task name usable as a single path component
fn path_component(name: &str) -> Result<&str> {
    if !is_single_component(name) {
        bail!("'{name}' cannot be used as an output file name");
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_utils::TaskMetadata;
    use serde_json::json;
    use tempfile::TempDir;

    fn output(dir: &TempDir) -> RunOutput {
        RunOutput::new(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap())
    }

    #[test]
    fn test_write_task_with_content() {
        let dir = TempDir::new().unwrap();
        let out = output(&dir);
        let result = TaskResult::success(
            "funding_scan",
            "perplexity",
            "Found 12 programs.",
            Some(json!({"count": 12})),
            TaskMetadata::default(),
        );

        let files = out.write_task("research_validation", &result).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].relative, "research_validation/funding_scan.json");
        assert_eq!(files[1].relative, "research_validation/funding_scan.md");
        assert_eq!(files[1].blake3, blake3_hex(b"Found 12 programs."));

        let stored: TaskResult = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("research_validation/funding_scan.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(stored, result);
    }

    #[test]
    fn test_error_result_has_no_content_file() {
        let dir = TempDir::new().unwrap();
        let out = output(&dir);
        let result = TaskResult::error("claim_challenge", "grok", "timeout", TaskMetadata::default());

        let files = out.write_task("research_validation", &result).unwrap();

        assert_eq!(files.len(), 1);
        assert!(!dir.path().join("research_validation/claim_challenge.md").exists());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let out = output(&dir);
        let result = TaskResult::error("../escape", "grok", "x", TaskMetadata::default());
        assert!(out.write_task("research_validation", &result).is_err());
        assert!(path_component("..").is_err());
        assert!(path_component("a\\b").is_err());
        assert!(path_component("budget_plan").is_ok());
    }
}
