mod cli_args;
mod credentials;
mod discovery;
mod model;
mod validation;

pub use cli_args::CliArgs;
pub use credentials::{CredentialSource, ResolvedCredential, default_api_key_env};
pub use model::*;
