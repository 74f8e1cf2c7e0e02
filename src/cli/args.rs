//! CLI argument definitions (clap)

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// quorum - phased multi-service analysis pipeline with acceptance gates
#[derive(Parser, Debug)]
#[command(name = "quorum")]
#[command(about = "Run a phased multi-service analysis pipeline with acceptance gates")]
#[command(long_about = r#"
quorum sends each phase's tasks to external text-generation services in
parallel, checks the joined results against the phase's acceptance gate, and
stops the pipeline when a gate does not clear. Numeric disagreements between
results are flagged as conflicts and summarized in a synthesis report.

EXAMPLES:
  # Run every phase, pausing for confirmation at each gate
  quorum run --pause-at-gate

  # Re-run a single phase after revising its inputs
  quorum run --phase spec_hardening

  # Which services have credentials?
  quorum status

  # Rough cost of a full run
  quorum estimate

  # Render the report of an earlier run as canonical JSON
  quorum synthesis --output-dir output --format structured

PHASES:
  research_validation → spec_hardening → messaging_coherence →
  implementation_planning → vulnerability_audit

CONFIGURATION:
  --config, else $QUORUM_HOME/config.toml, else .quorum/config.toml searched
  upward from the working directory, else built-in defaults.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level, span timings)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline, or a single phase
    Run {
        /// `all` or the name of one phase
        #[arg(long, default_value = "all")]
        phase: String,

        /// Skip gate evaluation; every phase proceeds
        #[arg(long)]
        no_gates: bool,

        /// Ask for confirmation after each gate
        #[arg(long)]
        pause_at_gate: bool,

        /// Directory for task results, gates and the report
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory of prompt templates (`<phase>/<task>.md`)
        #[arg(long)]
        prompts_dir: Option<PathBuf>,
    },

    /// Show each service's model, credential source and availability
    Status {
        /// Emit canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate the cost of a full run from static per-service figures
    Estimate {
        /// Emit canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the synthesis report of a previous run
    Synthesis {
        /// Output directory of the run
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = SynthesisFormat::Narrative)]
        format: SynthesisFormat,
    },
}

impl Commands {
    /// Command name used in error reports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run { .. } => "run",
            Self::Status { .. } => "status",
            Self::Estimate { .. } => "estimate",
            Self::Synthesis { .. } => "synthesis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SynthesisFormat {
    /// Markdown report
    Narrative,
    /// Canonical JSON of the same report
    Structured,
}

/// The clap command tree, for help generation and tests
#[must_use]
pub fn build_cli() -> clap::Command {
    Cli::command()
}
