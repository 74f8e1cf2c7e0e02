//! CLI command implementations
//!
//! One file per subcommand; shared helpers live in `common`.

mod common;
mod estimate;
mod pipeline;
mod status;
mod synthesis;

pub use estimate::execute_estimate_command;
pub use pipeline::execute_run_command;
pub use status::execute_status_command;
pub use synthesis::execute_synthesis_command;

pub use common::output_root;
