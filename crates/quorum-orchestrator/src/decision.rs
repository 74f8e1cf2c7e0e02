//! Human confirmation at gates

use anyhow::Result;
use dialoguer::{Select, theme::ColorfulTheme};
use quorum_gate::{GateResult, GateStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanDecision {
    Continue,
    Halt,
    /// Halt, flagging the phase for revision
    Revise,
}

/// Asks for a decision after a gate has been evaluated
pub trait GateDecider: Send + Sync {
    fn decide(&self, gate: &GateResult) -> Result<HumanDecision>;
}

/// Whether the pipeline may advance past `gate`.
///
/// Without a human decision a phase proceeds unless the gate failed. With
/// one, `continue` honors the validator outcome the same way and any other
/// answer halts.
#[must_use]
pub fn proceeds(gate: &GateResult, decision: Option<HumanDecision>) -> bool {
    match decision {
        None | Some(HumanDecision::Continue) => gate.status != GateStatus::Fail,
        Some(HumanDecision::Halt | HumanDecision::Revise) => false,
    }
}

/// Terminal prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerDecider;

impl GateDecider for DialoguerDecider {
    fn decide(&self, gate: &GateResult) -> Result<HumanDecision> {
        eprintln!("\n{}", gate.summary());
        for issue in &gate.blocking_issues {
            eprintln!("  blocking: {issue}");
        }
        for rec in &gate.recommendations {
            eprintln!("  recommendation: {rec}");
        }

        let options = &[
            "Continue to the next phase",
            "Halt the pipeline",
            "Halt and revise this phase",
        ];
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Gate {} ({}) is {}", gate.gate_number, gate.phase, gate.status))
            .items(options)
            .default(if gate.status == GateStatus::Fail { 1 } else { 0 })
            .interact()?;

        Ok(match selection {
            0 => HumanDecision::Continue,
            2 => HumanDecision::Revise,
            _ => HumanDecision::Halt,
        })
    }
}

/// Always answers the same; for scripted runs and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedDecider(pub HumanDecision);

impl GateDecider for FixedDecider {
    fn decide(&self, _gate: &GateResult) -> Result<HumanDecision> {
        Ok(self.0)
    }
}
