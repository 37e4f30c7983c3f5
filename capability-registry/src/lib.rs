//! Capability registration and uniform invocation.
//!
//! The registry owns the name-to-descriptor table and exposes two entry
//! points with an identical validation, logging, and result contract:
//! [`CapabilityRegistry::invoke`] for asynchronous call sites and
//! [`CapabilityRegistry::invoke_blocking`] for synchronous ones. Handler
//! errors and panics never escape an invocation; schema rejections and
//! handler failures come back inside the
//! [`InvocationResult`](capability_primitives::InvocationResult).

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod dispatch;
mod error;
mod registry;

pub use config::RegistryConfig;
pub use dispatch::{DedicatedRuntime, ExecutionContext};
pub use error::{RegistryError, RegistryResult};
pub use registry::CapabilityRegistry;
