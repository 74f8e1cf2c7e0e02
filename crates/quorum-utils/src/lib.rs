//! Foundation types and utilities shared by every quorum crate
//!
//! - `types`: the task result envelope produced by service adapters
//! - `error`: typed error taxonomy (adapter, config, top-level)
//! - `extraction`: best-effort structured-data extraction from model output
//! - `atomic_write` / `canonicalization`: deterministic artifact persistence
//! - `logging`: tracing subscriber setup and span helpers
//! - `redaction`: credential scrubbing for error messages

pub mod atomic_write;
pub mod canonicalization;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod redaction;
pub mod types;

pub use error::{AdapterError, ConfigError, QuorumError};
pub use types::{TaskMetadata, TaskResult, TaskStatus};
