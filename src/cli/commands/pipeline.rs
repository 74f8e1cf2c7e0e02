//! `quorum run`

use anyhow::{Context, Result};
use quorum_config::Config;
use quorum_llm::AdapterRegistry;
use quorum_orchestrator::{
    DialoguerDecider, Orchestrator, PhaseExecutor, PhaseReport, RunOutcome, RunOutput, RunState,
    RunSummary, phase_catalog,
};
use quorum_prompt_template::FilePromptProvider;
use quorum_utils::QuorumError;
use std::sync::Arc;
use tracing::info;

use super::common::output_root;

/// Run every phase (`all`) or exactly one named phase.
///
/// A full run starts over in the output directory. A single phase continues
/// the run already stored there, so its results join the earlier ones.
/// A halted pipeline is reported as `QuorumError::Halted` after the gate's
/// blocking issues and recommendations have been printed.
pub async fn execute_run_command(config: &Config, phase: &str, pause_at_gate: bool) -> Result<()> {
    let registry = AdapterRegistry::from_config(config).context("Failed to build service adapters")?;
    let root = output_root(config)?;
    let output = RunOutput::new(root.clone());
    let prompts = Arc::new(FilePromptProvider::new(&config.defaults.prompts_dir));

    let mut executor = PhaseExecutor::new(Arc::new(registry), prompts)
        .with_context(config.context.clone())
        .with_output(output.clone())
        .with_gates(config.defaults.gates_enabled);
    if pause_at_gate {
        executor = executor.with_decider(Arc::new(DialoguerDecider));
    }

    let threshold = config.defaults.conflict_threshold;
    let state = if phase == "all" {
        RunState::new(threshold)
    } else {
        RunState::resume(&output, threshold)?
    };
    let mut orchestrator = Orchestrator::new(phase_catalog(config), executor, state).with_output(output);

    info!(phase = phase, output = %root, "Starting run");
    let summary = if phase == "all" {
        orchestrator.run_all(pause_at_gate).await?
    } else {
        orchestrator.run_one(phase, pause_at_gate).await?
    };

    for report in &summary.reports {
        println!("{}", phase_line(report));
    }
    println!();

    match &summary.outcome {
        RunOutcome::Completed => {
            println!("✓ Run completed");
            println!("  Output: {root}");
            if summary.synthesis.is_some() {
                println!("  Synthesis report: {root}/synthesis_report.md");
            }
            let conflicts = orchestrator.state().aggregator.conflicts().len();
            if conflicts > 0 {
                println!("  Numeric conflicts: {conflicts} (see the report)");
            }
            Ok(())
        }
        RunOutcome::Halted { phase } => {
            print_halt(&summary, phase, &root.to_string());
            let status = summary
                .halting_gate()
                .map_or_else(|| "not evaluated".to_string(), |g| g.status.to_string());
            Err(QuorumError::Halted {
                phase: phase.clone(),
                status,
            }
            .into())
        }
    }
}

fn phase_line(report: &PhaseReport) -> String {
    let failed = report.results.iter().filter(|r| !r.is_success()).count();
    let mark = if report.proceed { "✓" } else { "✗" };
    let gate = report
        .gate
        .as_ref()
        .map_or_else(|| "no gate".to_string(), |g| format!("gate {}", g.status));

    let mut line = format!(
        "{mark} {}: {gate} ({} tasks, {failed} failed",
        report.phase,
        report.results.len()
    );
    if !report.skipped.is_empty() {
        line.push_str(&format!(", {} skipped", report.skipped.len()));
    }
    line.push(')');
    line
}

fn print_halt(summary: &RunSummary, phase: &str, root: &str) {
    eprintln!("✗ Pipeline halted at {phase}");
    if let Some(gate) = summary.halting_gate() {
        eprintln!("  {}", gate.summary());
        if !gate.blocking_issues.is_empty() {
            eprintln!("\n  Blocking issues:");
            for issue in &gate.blocking_issues {
                eprintln!("    - {issue}");
            }
        }
        if !gate.recommendations.is_empty() {
            eprintln!("\n  Recommendations:");
            for rec in &gate.recommendations {
                eprintln!("    - {rec}");
            }
        }
    }
    eprintln!("\n  Output: {root}");
}
