//! Configuration management for quorum
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. TOML files carry `[defaults]`, `[services.<name>]`,
//! `[[phases]]` and `[context]` sections.

mod config;

pub use config::*;
