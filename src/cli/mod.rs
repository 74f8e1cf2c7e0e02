//! Command-line interface
//!
//! - `args`: clap definitions
//! - `run`: entry point, configuration discovery, dispatch and error output
//! - `commands`: one module per subcommand

pub mod args;
mod commands;
mod run;


pub use args::{Cli, Commands, SynthesisFormat, build_cli};
pub use run::{run, run_with};
