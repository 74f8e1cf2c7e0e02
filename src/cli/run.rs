//! CLI entry point and dispatch
//!
//! `run()` owns all user-facing error output. Commands return `anyhow`
//! errors; the typed cause at the bottom of the chain picks the exit code.

use anyhow::Result;
use clap::Parser;
use quorum_config::{CliArgs, Config};
use quorum_utils::logging::init_tracing;
use quorum_utils::redaction::redact_error_message;
use quorum_utils::{ConfigError, QuorumError, error::UserFriendlyError};

use super::args::{Cli, Commands};
use super::commands;
use crate::exit_codes::{ExitCode, exit_code_for};

/// Parse the process arguments and execute the command.
///
/// Returns the exit code to terminate with on failure; everything has
/// already been printed.
pub fn run() -> Result<(), ExitCode> {
    run_with(Cli::parse())
}

/// Execute an already-parsed command line
pub fn run_with(cli: Cli) -> Result<(), ExitCode> {
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let cli_args = cli_args_for(&cli);
    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            report_error(&err, "config");
            return Err(exit_code_for(&err));
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.name();
    let result = rt.block_on(async {
        match cli.command {
            Commands::Run {
                phase,
                pause_at_gate,
                ..
            } => commands::execute_run_command(&config, &phase, pause_at_gate).await,
            Commands::Status { json } => commands::execute_status_command(&config, json),
            Commands::Estimate { json } => commands::execute_estimate_command(&config, json),
            Commands::Synthesis { format, .. } => {
                commands::execute_synthesis_command(&config, format)
            }
        }
    });

    result.map_err(|err| {
        report_error(&err, operation);
        exit_code_for(&err)
    })
}

/// Configuration overrides carried by the command line
pub(super) fn cli_args_for(cli: &Cli) -> CliArgs {
    let mut args = CliArgs {
        config_path: cli.config.clone(),
        ..CliArgs::default()
    };
    match &cli.command {
        Commands::Run {
            no_gates,
            output_dir,
            prompts_dir,
            ..
        } => {
            args.disable_gates = *no_gates;
            args.output_dir.clone_from(output_dir);
            args.prompts_dir.clone_from(prompts_dir);
        }
        Commands::Synthesis { output_dir, .. } => args.output_dir.clone_from(output_dir),
        Commands::Status { .. } | Commands::Estimate { .. } => {}
    }
    args
}

/// Print an error with its context chain and remediation hints
fn report_error(err: &anyhow::Error, operation: &str) {
    eprintln!("✗ {operation} failed: {}", redact_error_message(&format!("{err:#}")));

    let suggestions = err.chain().find_map(|cause| {
        cause
            .downcast_ref::<QuorumError>()
            .map(UserFriendlyError::suggestions)
            .or_else(|| {
                cause
                    .downcast_ref::<ConfigError>()
                    .map(UserFriendlyError::suggestions)
            })
    });
    if let Some(suggestions) = suggestions.filter(|s| !s.is_empty()) {
        eprintln!("\n  Suggestions:");
        for suggestion in suggestions {
            eprintln!("    - {suggestion}");
        }
    }
}
