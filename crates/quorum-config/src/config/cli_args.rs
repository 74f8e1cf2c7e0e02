use std::path::PathBuf;

/// CLI arguments that override configuration values
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit configuration file (skips discovery)
    pub config_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub prompts_dir: Option<PathBuf>,
    /// `--no-gates`
    pub disable_gates: bool,
}
