//! Service adapters for the external text-generation backends
//!
//! Every backend implements the single-attempt [`ServiceBackend`] trait. The
//! [`RetryingAdapter`] turns a backend into a [`ServiceAdapter`], the uniform
//! `execute(prompt, task, timeout) -> TaskResult` contract the phase executor
//! depends on. Adapters are looked up by service name through an
//! [`AdapterRegistry`] built once from configuration.

mod adapter;
pub mod backends;
mod http_client;
pub mod persona;
pub mod pricing;
mod registry;
mod types;

pub use adapter::{AdapterSettings, RetryPolicy, RetryingAdapter};
pub use registry::{AdapterRegistry, ServiceStatus};
pub use types::{BackendReply, Message, Role, ServiceAdapter, ServiceBackend, ServiceInvocation};

pub use quorum_utils::{AdapterError, TaskMetadata, TaskResult, TaskStatus};
