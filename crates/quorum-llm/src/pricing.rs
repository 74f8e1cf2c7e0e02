//! Static per-service cost heuristics for `quorum estimate`

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServicePricing {
    pub service: &'static str,
    /// USD per million input tokens
    pub input_per_mtok: f64,
    /// USD per million output tokens
    pub output_per_mtok: f64,
    pub typical_input_tokens: u64,
    pub typical_output_tokens: u64,
}

impl ServicePricing {
    #[must_use]
    pub fn cost_per_task(&self) -> f64 {
        (self.typical_input_tokens as f64 * self.input_per_mtok
            + self.typical_output_tokens as f64 * self.output_per_mtok)
            / 1_000_000.0
    }
}

pub const PRICING: [ServicePricing; 5] = [
    ServicePricing {
        service: "perplexity",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
        typical_input_tokens: 2_000,
        typical_output_tokens: 3_000,
    },
    ServicePricing {
        service: "grok",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
        typical_input_tokens: 2_500,
        typical_output_tokens: 4_000,
    },
    ServicePricing {
        service: "gemini",
        input_per_mtok: 1.25,
        output_per_mtok: 10.0,
        typical_input_tokens: 3_000,
        typical_output_tokens: 5_000,
    },
    ServicePricing {
        service: "claude",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
        typical_input_tokens: 2_500,
        typical_output_tokens: 4_000,
    },
    ServicePricing {
        service: "openai",
        input_per_mtok: 2.0,
        output_per_mtok: 8.0,
        typical_input_tokens: 2_500,
        typical_output_tokens: 4_000,
    },
];

#[must_use]
pub fn pricing_for(service: &str) -> Option<&'static ServicePricing> {
    PRICING.iter().find(|p| p.service == service)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub service: String,
    pub tasks: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// Estimate cost for `task_counts` (service → number of tasks bound to it)
///
/// Services without a pricing entry are skipped.
#[must_use]
pub fn estimate(task_counts: &BTreeMap<String, usize>) -> Vec<CostEstimate> {
    task_counts
        .iter()
        .filter_map(|(service, &tasks)| {
            let pricing = pricing_for(service)?;
            let n = tasks as u64;
            Some(CostEstimate {
                service: service.clone(),
                tasks,
                input_tokens: pricing.typical_input_tokens * n,
                output_tokens: pricing.typical_output_tokens * n,
                cost_usd: pricing.cost_per_task() * tasks as f64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_per_task() {
        let openai = pricing_for("openai").unwrap();
        // 2500 * 2 / 1e6 + 4000 * 8 / 1e6
        assert!((openai.cost_per_task() - 0.037).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_scales_with_tasks_and_skips_unknown() {
        let counts: BTreeMap<String, usize> = [
            ("grok".to_string(), 4),
            ("claude".to_string(), 3),
            ("mystery".to_string(), 9),
        ]
        .into_iter()
        .collect();

        let rows = estimate(&counts);

        assert_eq!(rows.len(), 2);
        let grok = rows.iter().find(|r| r.service == "grok").unwrap();
        assert_eq!(grok.tasks, 4);
        assert_eq!(grok.input_tokens, 10_000);
        assert!((grok.cost_usd - 4.0 * pricing_for("grok").unwrap().cost_per_task()).abs() < 1e-9);
    }
}
