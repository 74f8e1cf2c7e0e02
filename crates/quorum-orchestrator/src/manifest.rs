//! Run manifest (`run_manifest.json`)

use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use quorum_gate::GateStatus;
use quorum_utils::atomic_write::write_file_atomic;
use quorum_utils::canonicalization::{blake3_hex, emit_jcs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decision::HumanDecision;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseOutcome {
    Proceeded,
    Halted,
}

/// What happened to one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: String,
    pub ordinal: usize,
    pub outcome: PhaseOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_status: Option<GateStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<HumanDecision>,
    pub tasks_run: usize,
    pub tasks_failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks_skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub version: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Service name → available at start of run
    pub services: BTreeMap<String, bool>,
    pub phases: Vec<PhaseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<String>,
    /// Relative path → blake3 digest of every document written
    pub documents: BTreeMap<String, String>,
}

impl RunManifest {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            started_at,
            finished_at: None,
            services: BTreeMap::new(),
            phases: Vec::new(),
            halted_at: None,
            documents: BTreeMap::new(),
        }
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let json = emit_jcs(self).context("Failed to serialize run manifest")?;
        write_file_atomic(path, &json).with_context(|| format!("Failed to write manifest: {path}"))
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse manifest: {path}"))
    }

    /// Documents under `root` that are missing or no longer match their digest
    #[must_use]
    pub fn modified_documents(&self, root: &Utf8Path) -> Vec<String> {
        self.documents
            .iter()
            .filter(|(relative, digest)| match std::fs::read(root.join(relative.as_str())) {
                Ok(bytes) => blake3_hex(&bytes) != **digest,
                Err(_) => true,
            })
            .map(|(relative, _)| relative.clone())
            .collect()
    }
}
