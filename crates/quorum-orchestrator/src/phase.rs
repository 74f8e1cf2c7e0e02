//! Phase descriptors and the default five-phase catalog

use quorum_config::{Config, PhaseConfig};
use quorum_gate::rules::{
    IMPLEMENTATION_PLANNING, MESSAGING_COHERENCE, RESEARCH_VALIDATION, SPEC_HARDENING,
    VULNERABILITY_AUDIT,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// One ordered stage of the pipeline. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub name: String,
    /// 1-based position; also the gate number
    pub ordinal: usize,
    /// Task names in declaration order
    pub tasks: Vec<String>,
    /// Task name → service name
    pub services: BTreeMap<String, String>,
    pub gate_required: bool,
    pub parallel_limit: usize,
    /// Per-attempt deadline for every task of the phase
    pub task_timeout: Duration,
}

impl PhaseDescriptor {
    fn builtin(
        name: &str,
        ordinal: usize,
        bindings: &[(&str, &str)],
        parallel_limit: usize,
        timeout_secs: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            ordinal,
            tasks: bindings.iter().map(|(t, _)| (*t).to_string()).collect(),
            services: bindings
                .iter()
                .map(|(t, s)| ((*t).to_string(), (*s).to_string()))
                .collect(),
            gate_required: true,
            parallel_limit,
            task_timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[must_use]
    pub fn from_config(phase: &PhaseConfig, ordinal: usize) -> Self {
        Self {
            name: phase.name.clone(),
            ordinal,
            tasks: phase.tasks.clone(),
            services: phase.services.clone(),
            gate_required: phase.gate_required,
            parallel_limit: phase.parallel_limit,
            task_timeout: Duration::from_secs(phase.task_timeout_secs),
        }
    }

    /// Service bound to `task`
    #[must_use]
    pub fn service_for(&self, task: &str) -> Option<&str> {
        self.services.get(task).map(String::as_str)
    }
}

/// The five phases that ship by default
#[must_use]
pub fn default_phases() -> Vec<PhaseDescriptor> {
    vec![
        PhaseDescriptor::builtin(
            RESEARCH_VALIDATION,
            1,
            &[
                ("claim_verification", "perplexity"),
                ("funding_scan", "perplexity"),
                ("claim_challenge", "grok"),
            ],
            3,
            300,
        ),
        PhaseDescriptor::builtin(
            SPEC_HARDENING,
            2,
            &[
                ("edge_case_matrix", "grok"),
                ("latency_budget", "gemini"),
                ("failure_modes", "openai"),
            ],
            2,
            600,
        ),
        PhaseDescriptor::builtin(
            MESSAGING_COHERENCE,
            3,
            &[
                ("narrative_variants", "claude"),
                ("closing_statement", "claude"),
                ("message_stress_test", "grok"),
            ],
            2,
            600,
        ),
        PhaseDescriptor::builtin(
            IMPLEMENTATION_PLANNING,
            4,
            &[
                ("architecture_review", "gemini"),
                ("budget_plan", "openai"),
                ("timeline_review", "grok"),
            ],
            3,
            600,
        ),
        PhaseDescriptor::builtin(
            VULNERABILITY_AUDIT,
            5,
            &[
                ("assumption_audit", "grok"),
                ("failure_scenarios", "openai"),
                ("mitigation_priorities", "claude"),
            ],
            3,
            600,
        ),
    ]
}

/// Default phases merged with `[[phases]]` from configuration.
///
/// A configured phase named like a default replaces it in place; any other
/// configured phase is appended. Ordinals follow final position.
#[must_use]
pub fn phase_catalog(config: &Config) -> Vec<PhaseDescriptor> {
    let mut phases = default_phases();
    for configured in &config.phases {
        match phases.iter().position(|p| p.name == configured.name) {
            Some(i) => phases[i] = PhaseDescriptor::from_config(configured, i + 1),
            None => {
                let ordinal = phases.len() + 1;
                phases.push(PhaseDescriptor::from_config(configured, ordinal));
            }
        }
    }
    phases
}

/// Number of tasks bound to each service across `phases`
#[must_use]
pub fn task_counts(phases: &[PhaseDescriptor]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for phase in phases {
        for task in &phase.tasks {
            if let Some(service) = phase.service_for(task) {
                *counts.entry(service.to_string()).or_insert(0) += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(name: &str) -> PhaseConfig {
        PhaseConfig {
            name: name.to_string(),
            tasks: vec!["pitch_review".to_string()],
            services: [("pitch_review".to_string(), "claude".to_string())]
                .into_iter()
                .collect(),
            gate_required: false,
            parallel_limit: 1,
            task_timeout_secs: 120,
        }
    }

    #[test]
    fn test_default_catalog() {
        let phases = default_phases();
        let names: Vec<&str> = phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "research_validation",
                "spec_hardening",
                "messaging_coherence",
                "implementation_planning",
                "vulnerability_audit"
            ]
        );
        for (i, phase) in phases.iter().enumerate() {
            assert_eq!(phase.ordinal, i + 1);
            assert!(phase.gate_required);
            for task in &phase.tasks {
                assert!(phase.service_for(task).is_some(), "{task} unbound");
            }
        }
        assert_eq!(phases[0].task_timeout, Duration::from_secs(300));
        assert_eq!(phases[1].parallel_limit, 2);
    }

    #[test]
    fn test_catalog_appends_and_replaces() {
        let config = Config {
            phases: vec![configured("investor_review"), configured("spec_hardening")],
            ..Config::default()
        };
        let phases = phase_catalog(&config);

        assert_eq!(phases.len(), 6);
        assert_eq!(phases[1].name, "spec_hardening");
        assert_eq!(phases[1].ordinal, 2);
        assert_eq!(phases[1].tasks, vec!["pitch_review".to_string()]);
        assert!(!phases[1].gate_required);
        assert_eq!(phases[5].name, "investor_review");
        assert_eq!(phases[5].ordinal, 6);
    }

    #[test]
    fn test_task_counts_over_defaults() {
        let counts = task_counts(&default_phases());
        assert_eq!(counts["grok"], 5);
        assert_eq!(counts["perplexity"], 2);
        assert_eq!(counts["claude"], 3);
        assert_eq!(counts["gemini"], 2);
        assert_eq!(counts["openai"], 3);
        assert_eq!(counts.values().sum::<usize>(), 15);
    }
}
