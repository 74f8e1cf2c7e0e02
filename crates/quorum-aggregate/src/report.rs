//! Synthesis report
//!
//! The report is a pure function of the aggregator's state: no timestamps,
//! no hash-map iteration, so repeated synthesis of unchanged state is
//! byte-identical in both the Markdown and the canonical JSON rendering.

use anyhow::Context;
use quorum_utils::TaskStatus;
use quorum_utils::canonicalization::emit_jcs;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

use crate::aggregator::{AggregateSummary, ResultAggregator, StoredResult};
use crate::conflict::ConflictRecord;

pub const NEXT_STEPS: [&str; 4] = [
    "Resolve each listed conflict against primary sources before relying on either figure.",
    "Work through open gate recommendations and re-run the affected phases.",
    "Re-run failed tasks once the underlying service issue is cleared.",
    "Regenerate this report after revisions with `quorum synthesis`.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisReport {
    pub summary: AggregateSummary,
    pub phases: Vec<PhaseSection>,
    pub conflicts: Vec<ConflictRecord>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSection {
    pub phase: String,
    pub tasks: Vec<TaskLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskLine {
    pub task: String,
    pub service: String,
    pub status: TaskStatus,
    /// Every `summary` field found in the task's structured data
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskLine {
    fn from_stored(stored: &StoredResult) -> Self {
        let mut summaries = Vec::new();
        if let Some(doc) = &stored.result.structured_data {
            collect_summaries(doc, &mut summaries);
        }
        Self {
            task: stored.task.clone(),
            service: stored.result.service.clone(),
            status: stored.result.status,
            summaries,
            error: stored.result.error.clone(),
        }
    }
}

fn collect_summaries(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "summary" {
                    match child {
                        Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                        Value::String(_) | Value::Null => {}
                        other => out.push(other.to_string()),
                    }
                } else {
                    collect_summaries(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_summaries(v, out)),
        _ => {}
    }
}

impl ResultAggregator {
    /// Report model over the current state
    #[must_use]
    pub fn report(&self) -> SynthesisReport {
        let phases = self
            .phases()
            .into_iter()
            .map(|phase| PhaseSection {
                phase: phase.to_string(),
                tasks: self.phase_results(phase).map(TaskLine::from_stored).collect(),
            })
            .collect();

        SynthesisReport {
            summary: self.summary(),
            phases,
            conflicts: self.conflicts().to_vec(),
            next_steps: NEXT_STEPS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Narrative (Markdown) synthesis report
    #[must_use]
    pub fn synthesize(&self) -> String {
        self.report().to_markdown()
    }
}

impl SynthesisReport {
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        out.push_str("# Synthesis Report\n\n## Executive Summary\n\n");
        let _ = writeln!(out, "- Phases covered: {}", s.by_phase.len());
        let _ = writeln!(
            out,
            "- Tasks: {} ({} succeeded, {} failed)",
            s.total_results, s.succeeded, s.failed
        );
        let _ = writeln!(out, "- Numeric conflicts: {}", s.conflicts);

        for section in &self.phases {
            let _ = write!(out, "\n## Phase: {}\n\n", section.phase);
            for line in &section.tasks {
                match (&line.status, &line.error) {
                    (TaskStatus::Error, Some(err)) => {
                        let first = err.lines().next().unwrap_or_default();
                        let _ = writeln!(out, "- **{}** ({}): error: {first}", line.task, line.service);
                    }
                    (status, _) => {
                        let _ = writeln!(out, "- **{}** ({}): {status}", line.task, line.service);
                    }
                }
                for summary in &line.summaries {
                    let _ = writeln!(out, "  - {summary}");
                }
            }
        }

        out.push_str("\n## Conflicts\n\n");
        if self.conflicts.is_empty() {
            out.push_str("No numeric conflicts detected.\n");
        } else {
            for (i, conflict) in self.conflicts.iter().enumerate() {
                let _ = writeln!(out, "{}. {conflict}", i + 1);
            }
        }

        out.push_str("\n## Next Steps\n\n");
        for (i, step) in self.next_steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {step}", i + 1);
        }
        out
    }

    /// Structured rendering as canonical JSON
    pub fn to_canonical_json(&self) -> anyhow::Result<String> {
        emit_jcs(self).context("Failed to emit synthesis report JSON")
    }
}
