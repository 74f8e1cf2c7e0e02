//! Per-phase criterion sets
//!
//! Each default phase has a fixed list of criteria. A phase with no rule set of
//! its own is held to [`FALLBACK`]: every task must have succeeded.

use serde_json::Value;

use crate::criteria::{
    Criterion, CriterionCheck, PhaseEvidence, as_number, is_populated, word_count,
};
use crate::types::Severity;

pub const RESEARCH_VALIDATION: &str = "research_validation";
pub const SPEC_HARDENING: &str = "spec_hardening";
pub const MESSAGING_COHERENCE: &str = "messaging_coherence";
pub const IMPLEMENTATION_PLANNING: &str = "implementation_planning";
pub const VULNERABILITY_AUDIT: &str = "vulnerability_audit";

pub const MIN_VERIFICATION_RATE: f64 = 0.80;
pub const MIN_FUNDING_OPPORTUNITIES: usize = 10;
pub const MIN_FIXED_DEADLINES: usize = 3;
pub const MIN_EDGE_CASES: usize = 25;
pub const MAX_LATENCY_MS: f64 = 100.0;
pub const MIN_NARRATIVE_VARIANTS: usize = 2;
pub const WORD_COUNT_RANGE: std::ops::RangeInclusive<usize> = 50..=1500;
pub const MIN_CONTINGENCY_PERCENT: f64 = 20.0;
pub const MIN_ASSUMPTION_CATEGORIES: usize = 6;
pub const MIN_FAILURE_SCENARIOS: usize = 10;

/// Criteria for `phase`, or [`FALLBACK`] for phases without a rule set
#[must_use]
pub fn rules_for(phase: &str) -> &'static [Criterion] {
    match phase {
        RESEARCH_VALIDATION => &RESEARCH_RULES,
        SPEC_HARDENING => &SPEC_RULES,
        MESSAGING_COHERENCE => &MESSAGING_RULES,
        IMPLEMENTATION_PLANNING => &PLANNING_RULES,
        VULNERABILITY_AUDIT => &AUDIT_RULES,
        _ => &FALLBACK,
    }
}

static RESEARCH_RULES: [Criterion; 4] = [
    Criterion {
        name: "claim_verification_rate",
        description: "At least 80% of checked claims are confirmed",
        severity: Severity::Soft,
        remedy: "Re-verify unconfirmed claims or drop them from the material",
        check: claim_verification_rate,
    },
    Criterion {
        name: "funding_opportunities_found",
        description: "At least 10 funding opportunities identified",
        severity: Severity::Soft,
        remedy: "Broaden the funding scan to more programs",
        check: funding_opportunities_found,
    },
    Criterion {
        name: "fixed_deadline_opportunities",
        description: "At least 3 opportunities with fixed (non-rolling) deadlines",
        severity: Severity::Soft,
        remedy: "Look for calls with fixed submission windows",
        check: fixed_deadline_opportunities,
    },
    Criterion {
        name: "no_contradicted_claims",
        description: "No claim is contradicted by the evidence",
        severity: Severity::Hard,
        remedy: "Remove or correct contradicted claims before continuing",
        check: no_contradicted_claims,
    },
];

static SPEC_RULES: [Criterion; 3] = [
    Criterion {
        name: "edge_case_coverage",
        description: "At least 25 populated edge-case cells",
        severity: Severity::Soft,
        remedy: "Fill in the remaining edge-case matrix cells",
        check: edge_case_coverage,
    },
    Criterion {
        name: "latency_budget",
        description: "Derived end-to-end latency is at most 100ms",
        severity: Severity::Soft,
        remedy: "Trim latency components until the total fits the budget",
        check: latency_budget,
    },
    Criterion {
        name: "critical_cells_mitigated",
        description: "Every critical edge case has an immediate mitigation",
        severity: Severity::Hard,
        remedy: "Add an immediate mitigation to each critical edge case",
        check: critical_cells_mitigated,
    },
];

static MESSAGING_RULES: [Criterion; 3] = [
    Criterion {
        name: "narrative_variants",
        description: "At least 2 narrative variants produced",
        severity: Severity::Soft,
        remedy: "Draft additional narrative variants",
        check: narrative_variants,
    },
    Criterion {
        name: "closing_statement_present",
        description: "A closing statement was delivered",
        severity: Severity::Soft,
        remedy: "Produce the closing statement",
        check: closing_statement_present,
    },
    Criterion {
        name: "word_count_sanity",
        description: "Narrative outputs are between 50 and 1500 words",
        severity: Severity::Soft,
        remedy: "Tighten or expand the narrative outputs to a presentable length",
        check: word_count_sanity,
    },
];

static PLANNING_RULES: [Criterion; 3] = [
    Criterion {
        name: "architecture_review_succeeded",
        description: "The architecture review task completed",
        severity: Severity::Soft,
        remedy: "Re-run the architecture review",
        check: architecture_review_succeeded,
    },
    Criterion {
        name: "contingency_budget",
        description: "Contingency budget is at least 20%",
        severity: Severity::Soft,
        remedy: "Raise the contingency reserve to at least 20%",
        check: contingency_budget,
    },
    Criterion {
        name: "timeline_realistic",
        description: "The timeline review judged the plan realistic",
        severity: Severity::Soft,
        remedy: "Rework the timeline until the reviewer accepts it",
        check: timeline_realistic,
    },
];

static AUDIT_RULES: [Criterion; 3] = [
    Criterion {
        name: "assumption_categories",
        description: "At least 6 assumption categories audited",
        severity: Severity::Soft,
        remedy: "Cover more assumption categories in the audit",
        check: assumption_categories,
    },
    Criterion {
        name: "failure_scenarios",
        description: "At least 10 failure scenarios enumerated",
        severity: Severity::Soft,
        remedy: "Enumerate further failure scenarios",
        check: failure_scenarios,
    },
    Criterion {
        name: "mitigation_priorities",
        description: "Mitigation priorities are defined",
        severity: Severity::Soft,
        remedy: "Rank mitigations by priority",
        check: mitigation_priorities,
    },
];

pub static FALLBACK: [Criterion; 1] = [Criterion {
    name: "all_tasks_succeeded",
    description: "Every task in the phase succeeded",
    severity: Severity::Soft,
    remedy: "Re-run the failed tasks",
    check: all_tasks_succeeded,
}];

fn at_least(key: &str, count: usize, min: usize) -> CriterionCheck {
    CriterionCheck::new(count >= min, format!("{count} {key}"), format!(">= {min}"))
}

/// Array length or object key count
fn collection_len(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn text_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str).map(str::trim)
}

fn claim_verification_rate(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {:.0}%", MIN_VERIFICATION_RATE * 100.0);
    let Some(total) = ev.number("total_claims").filter(|t| *t > 0.0) else {
        return CriterionCheck::missing("total_claims", expected);
    };
    let confirmed = ev.number("confirmed").unwrap_or(0.0);
    let rate = confirmed / total;
    CriterionCheck::new(
        rate >= MIN_VERIFICATION_RATE,
        format!("{confirmed}/{total} ({:.1}%)", rate * 100.0),
        expected,
    )
}

fn funding_opportunities_found(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_FUNDING_OPPORTUNITIES}");
    match ev.array("funding_opportunities") {
        Some(items) => at_least("opportunities", items.len(), MIN_FUNDING_OPPORTUNITIES),
        None => CriterionCheck::missing("funding_opportunities", expected),
    }
}

fn is_fixed_deadline(item: &Value) -> bool {
    if let Some(kind) = text_field(item, "deadline_type") {
        return kind.eq_ignore_ascii_case("fixed");
    }
    match item.get("deadline") {
        Some(Value::String(s)) => !s.trim().is_empty() && !s.trim().eq_ignore_ascii_case("rolling"),
        Some(other) => is_populated(other),
        None => false,
    }
}

fn fixed_deadline_opportunities(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_FIXED_DEADLINES}");
    match ev.array("funding_opportunities") {
        Some(items) => {
            let fixed = items.iter().filter(|i| is_fixed_deadline(i)).count();
            at_least("fixed-deadline opportunities", fixed, MIN_FIXED_DEADLINES)
        }
        None => CriterionCheck::missing("funding_opportunities", expected),
    }
}

fn no_contradicted_claims(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let contradicted = match ev.find("contradicted") {
        Some(Value::Array(items)) => items.len() as f64,
        Some(other) => as_number(other).unwrap_or(0.0),
        None => 0.0,
    };
    CriterionCheck::new(
        contradicted <= 0.0,
        format!("{contradicted} contradicted claim(s)"),
        "0",
    )
}

fn is_populated_cell(cell: &Value) -> bool {
    cell.as_object()
        .is_some_and(|map| map.values().any(is_populated))
}

fn edge_case_coverage(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_EDGE_CASES}");
    match ev.array("edge_cases") {
        Some(cells) => {
            let populated = cells.iter().filter(|c| is_populated_cell(c)).count();
            at_least("populated cells", populated, MIN_EDGE_CASES)
        }
        None => CriterionCheck::missing("edge_cases", expected),
    }
}

fn latency_budget(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!("<= {MAX_LATENCY_MS}ms");
    let total = match ev.array("latency_components") {
        Some(parts) if !parts.is_empty() => Some(
            parts
                .iter()
                .filter_map(|p| p.get("ms").and_then(as_number))
                .sum::<f64>(),
        ),
        _ => ev.number("latency_total_ms"),
    };
    match total {
        Some(ms) => CriterionCheck::new(ms <= MAX_LATENCY_MS, format!("{ms}ms"), expected),
        None => CriterionCheck::missing("latency_components", expected),
    }
}

fn critical_cells_mitigated(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let cells = ev.array("edge_cases").map(Vec::as_slice).unwrap_or_default();
    let unmitigated: Vec<String> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| {
            text_field(cell, "severity").is_some_and(|s| s.eq_ignore_ascii_case("critical"))
        })
        .filter(|(_, cell)| !cell.get("immediate_mitigation").is_some_and(is_populated))
        .map(|(i, cell)| {
            text_field(cell, "name")
                .or_else(|| text_field(cell, "id"))
                .map_or_else(|| format!("edge_cases[{i}]"), str::to_string)
        })
        .collect();

    let actual = if unmitigated.is_empty() {
        "all critical cells mitigated".to_string()
    } else {
        format!("unmitigated: {}", unmitigated.join(", "))
    };
    CriterionCheck::new(unmitigated.is_empty(), actual, "0 unmitigated critical cells")
}

fn narrative_variants(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_NARRATIVE_VARIANTS}");
    match ev.find("narrative_variants").and_then(collection_len) {
        Some(count) => at_least("variants", count, MIN_NARRATIVE_VARIANTS),
        None => CriterionCheck::missing("narrative_variants", expected),
    }
}

fn closing_statement_present(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let keyed = ev
        .find("closing_statement")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    let delivered = ev
        .task("closing_statement")
        .is_some_and(|r| r.is_success() && r.text().is_some());

    let actual = if keyed || delivered { "present" } else { "absent" };
    CriterionCheck::new(keyed || delivered, actual, "present")
}

const WORD_COUNTED_TASKS: [&str; 2] = ["narrative_variants", "closing_statement"];

fn word_count_sanity(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let counts: Vec<(&str, usize)> = WORD_COUNTED_TASKS
        .iter()
        .filter_map(|task| {
            let result = ev.task(task).filter(|r| r.is_success())?;
            Some((*task, word_count(result.text()?)))
        })
        .collect();

    let expected = format!(
        "{}..={} words each",
        WORD_COUNT_RANGE.start(),
        WORD_COUNT_RANGE.end()
    );
    if counts.is_empty() {
        return CriterionCheck::new(false, "no narrative output to measure", expected);
    }

    let passed = counts.iter().all(|(_, n)| WORD_COUNT_RANGE.contains(n));
    let actual = counts
        .iter()
        .map(|(task, n)| format!("{task}={n}"))
        .collect::<Vec<_>>()
        .join(", ");
    CriterionCheck::new(passed, actual, expected)
}

fn architecture_review_succeeded(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let actual = match ev.task("architecture_review") {
        Some(r) => r.status.to_string(),
        None => "not run".to_string(),
    };
    CriterionCheck::new(ev.task_succeeded("architecture_review"), actual, "success")
}

fn contingency_budget(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_CONTINGENCY_PERCENT}%");
    match ev.number("contingency_percent") {
        Some(pct) => CriterionCheck::new(pct >= MIN_CONTINGENCY_PERCENT, format!("{pct}%"), expected),
        None => CriterionCheck::missing("contingency_percent", expected),
    }
}

fn timeline_realistic(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let flag = match ev.find("timeline_realistic") {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => Some(s.trim().eq_ignore_ascii_case("true")),
        _ => None,
    };
    match flag {
        Some(b) => CriterionCheck::new(b, b.to_string(), "true"),
        None => CriterionCheck::missing("timeline_realistic", "true"),
    }
}

fn assumption_categories(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_ASSUMPTION_CATEGORIES}");
    match ev.find("assumption_categories").and_then(collection_len) {
        Some(count) => at_least("categories", count, MIN_ASSUMPTION_CATEGORIES),
        None => CriterionCheck::missing("assumption_categories", expected),
    }
}

fn failure_scenarios(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let expected = format!(">= {MIN_FAILURE_SCENARIOS}");
    match ev.array("failure_scenarios") {
        Some(items) => at_least("scenarios", items.len(), MIN_FAILURE_SCENARIOS),
        None => CriterionCheck::missing("failure_scenarios", expected),
    }
}

fn mitigation_priorities(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let present = ev.find("mitigation_priorities").is_some_and(is_populated);
    let actual = if present { "present" } else { "absent or empty" };
    CriterionCheck::new(present, actual, "non-empty")
}

fn all_tasks_succeeded(ev: &PhaseEvidence<'_>) -> CriterionCheck {
    let failed: Vec<&str> = ev
        .results()
        .iter()
        .filter(|r| !r.is_success())
        .map(|r| r.task.as_str())
        .collect();
    let actual = if failed.is_empty() {
        format!("{} task(s) succeeded", ev.results().len())
    } else {
        format!("failed: {}", failed.join(", "))
    };
    CriterionCheck::new(failed.is_empty(), actual, "no failed tasks")
}
