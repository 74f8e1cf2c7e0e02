//! `quorum synthesis`

use anyhow::{Context, Result};
use camino::Utf8Path;
use quorum_aggregate::{AggregateSnapshot, ResultAggregator, SNAPSHOT_FILE};
use quorum_config::Config;
use quorum_orchestrator::RunManifest;
use quorum_orchestrator::output::MANIFEST_FILE;
use quorum_utils::QuorumError;
use tracing::warn;

use super::common::output_root;
use crate::cli::args::SynthesisFormat;

/// Render the report of the run stored in the configured output directory
pub fn execute_synthesis_command(config: &Config, format: SynthesisFormat) -> Result<()> {
    let root = output_root(config)?;
    let aggregator = load_run(&root, config.defaults.conflict_threshold)?;
    println!("{}", render(&aggregator, format)?);
    Ok(())
}

/// Restore the aggregator of a previous run, warning about edited outputs
fn load_run(root: &Utf8Path, threshold: f64) -> Result<ResultAggregator> {
    let unavailable = |reason: String| QuorumError::Artifacts {
        dir: root.to_string(),
        reason,
    };

    if !root.is_dir() {
        return Err(unavailable("directory does not exist".to_string()).into());
    }
    let snapshot_path = root.join(SNAPSHOT_FILE);
    if !snapshot_path.is_file() {
        return Err(unavailable(format!("no {SNAPSHOT_FILE}")).into());
    }
    let snapshot = AggregateSnapshot::load(&snapshot_path)
        .map_err(|e| unavailable(format!("{e:#}")))?;

    let manifest_path = root.join(MANIFEST_FILE);
    if manifest_path.is_file() {
        let manifest = RunManifest::load(&manifest_path)?;
        for document in manifest.modified_documents(root) {
            warn!(document = %document, "Output changed or removed since the run");
        }
        if let Some(phase) = &manifest.halted_at {
            warn!(phase = %phase, "Run halted before completing; report covers phases run");
        }
    }

    Ok(ResultAggregator::from_snapshot(snapshot, threshold))
}

fn render(aggregator: &ResultAggregator, format: SynthesisFormat) -> Result<String> {
    match format {
        SynthesisFormat::Narrative => Ok(aggregator.synthesize()),
        SynthesisFormat::Structured => aggregator
            .report()
            .to_canonical_json()
            .context("Failed to emit structured synthesis"),
    }
}
