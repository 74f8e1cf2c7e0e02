//! `quorum estimate`

use anyhow::{Context, Result};
use quorum_config::Config;
use quorum_llm::pricing::{CostEstimate, estimate};
use quorum_orchestrator::{phase_catalog, task_counts};
use quorum_utils::canonicalization::emit_jcs;
use serde::Serialize;

use super::common::usd;

#[derive(Debug, Serialize)]
struct EstimateDocument {
    services: Vec<CostEstimate>,
    total_tasks: usize,
    total_usd: f64,
}

/// Static cost estimate for one full run of the configured catalog.
///
/// Independent of credentials and of any previous run.
pub fn execute_estimate_command(config: &Config, json: bool) -> Result<()> {
    let doc = build_estimate(config);

    if json {
        let output = emit_jcs(&doc).context("Failed to emit estimate JSON")?;
        println!("{output}");
        return Ok(());
    }

    println!("Estimated cost of a full run (static per-service figures):\n");
    for line in &doc.services {
        println!(
            "  {:<11} {:>2} tasks  {:>8} in / {:>8} out tokens  {:>8}",
            line.service,
            line.tasks,
            line.input_tokens,
            line.output_tokens,
            usd(line.cost_usd)
        );
    }
    println!("\n  Total: {} tasks, {}", doc.total_tasks, usd(doc.total_usd));
    Ok(())
}

fn build_estimate(config: &Config) -> EstimateDocument {
    let services = estimate(&task_counts(&phase_catalog(config)));
    EstimateDocument {
        total_tasks: services.iter().map(|s| s.tasks).sum(),
        total_usd: services.iter().map(|s| s.cost_usd).sum(),
        services,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_estimate() {
        let doc = build_estimate(&Config::default());

        assert_eq!(doc.total_tasks, 15);
        assert_eq!(doc.services.len(), 5);
        let grok = doc.services.iter().find(|s| s.service == "grok").unwrap();
        assert_eq!(grok.tasks, 5);
        let per_service: f64 = doc.services.iter().map(|s| s.cost_usd).sum();
        assert!((doc.total_usd - per_service).abs() < 1e-12);
    }
}
