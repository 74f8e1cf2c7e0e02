//! Process exit codes and their mapping from errors
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | internal error |
//! | 2 | invalid arguments or configuration |
//! | 3 | pipeline halted at a gate |
//! | 4 | run artifacts missing or invalid |

use quorum_utils::{ConfigError, QuorumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(codes::SUCCESS);

    pub const INTERNAL: ExitCode = ExitCode(codes::INTERNAL);

    pub const CLI_ARGS: ExitCode = ExitCode(codes::CLI_ARGS);

    /// A gate did not clear; later phases were not run
    pub const HALTED: ExitCode = ExitCode(codes::HALTED);

    pub const ARTIFACTS: ExitCode = ExitCode(codes::ARTIFACTS);

    /// Numeric value for `std::process::exit`
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const INTERNAL: i32 = 1;
    pub const CLI_ARGS: i32 = 2;
    pub const HALTED: i32 = 3;
    pub const ARTIFACTS: i32 = 4;
}

/// Exit code for an error surfaced by a command.
///
/// Looks through the `anyhow` context chain for a typed cause; anything
/// unrecognized is an internal error.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return ExitCode::CLI_ARGS;
        }
        if let Some(err) = cause.downcast_ref::<QuorumError>() {
            return match err {
                QuorumError::Config(_) | QuorumError::UnknownPhase(_) => ExitCode::CLI_ARGS,
                QuorumError::Halted { .. } => ExitCode::HALTED,
                QuorumError::Artifacts { .. } => ExitCode::ARTIFACTS,
                _ => ExitCode::INTERNAL,
            };
        }
    }
    ExitCode::INTERNAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::HALTED.as_i32(), 3);
        assert_eq!(i32::from(ExitCode::ARTIFACTS), 4);
    }

    #[test]
    fn test_config_error_maps_to_cli_args() {
        let err = anyhow::Error::from(ConfigError::NotFound("quorum.toml".into()))
            .context("Failed to load configuration");
        assert_eq!(exit_code_for(&err), ExitCode::CLI_ARGS);
    }

    #[test]
    fn test_halted_maps_through_context() {
        let result: Result<(), QuorumError> = Err(QuorumError::Halted {
            phase: "spec_hardening".into(),
            status: "fail".into(),
        });
        let err = result.context("run failed").unwrap_err();
        assert_eq!(exit_code_for(&err), ExitCode::HALTED);
    }

    #[test]
    fn test_pipeline_errors() {
        let unknown = anyhow::Error::from(QuorumError::UnknownPhase("launch".into()));
        assert_eq!(exit_code_for(&unknown), ExitCode::CLI_ARGS);

        let artifacts = anyhow::Error::from(QuorumError::Artifacts {
            dir: "output".into(),
            reason: "no snapshot".into(),
        });
        assert_eq!(exit_code_for(&artifacts), ExitCode::ARTIFACTS);

        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), ExitCode::INTERNAL);
    }
}
