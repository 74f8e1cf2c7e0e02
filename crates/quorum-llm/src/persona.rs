//! Built-in service profiles
//!
//! Each service plays a fixed role in the pipeline. The persona supplies the
//! system preamble, the default temperature and the defaults a
//! `[services.<name>]` section may override.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Persona {
    pub service: &'static str,
    /// Short role label shown by `quorum status`
    pub role: &'static str,
    pub system_preamble: &'static str,
    pub temperature: f32,
    pub default_model: &'static str,
    pub max_tokens: u32,
    pub default_timeout: Duration,
}

pub const PERSONAS: [Persona; 5] = [
    Persona {
        service: "perplexity",
        role: "fact-finding",
        system_preamble: "You are a meticulous research analyst. Verify every claim against \
            current, citable sources. Distinguish confirmed, unverified and contradicted \
            claims explicitly and never speculate beyond the evidence.",
        temperature: 0.2,
        default_model: "sonar-pro",
        max_tokens: 4096,
        default_timeout: Duration::from_secs(300),
    },
    Persona {
        service: "grok",
        role: "adversarial critique",
        system_preamble: "You are an adversarial reviewer. Attack assumptions, hunt for edge \
            cases and failure modes, and argue the strongest case against the proposal. Be \
            specific and concrete.",
        temperature: 0.7,
        default_model: "grok-4",
        max_tokens: 4096,
        default_timeout: Duration::from_secs(600),
    },
    Persona {
        service: "gemini",
        role: "architecture review",
        system_preamble: "You are a principal systems architect. Evaluate structure, latency \
            budgets, scalability and integration risk. Quantify wherever possible.",
        temperature: 0.3,
        default_model: "gemini-2.5-pro",
        max_tokens: 8192,
        default_timeout: Duration::from_secs(600),
    },
    Persona {
        service: "claude",
        role: "narrative writing",
        system_preamble: "You are an experienced communications strategist. Write clear, \
            persuasive narrative that stays faithful to the underlying facts.",
        temperature: 0.8,
        default_model: "claude-sonnet-4-5",
        max_tokens: 4096,
        default_timeout: Duration::from_secs(600),
    },
    Persona {
        service: "openai",
        role: "technical analysis and planning",
        system_preamble: "You are a pragmatic technical program manager. Produce rigorous \
            analysis, budgets and plans with explicit assumptions and contingencies.",
        temperature: 0.4,
        default_model: "gpt-4.1",
        max_tokens: 4096,
        default_timeout: Duration::from_secs(600),
    },
];

#[must_use]
pub fn persona_for(service: &str) -> Option<&'static Persona> {
    PERSONAS.iter().find(|p| p.service == service)
}
