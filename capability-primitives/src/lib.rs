//! Core shared types for the capability runtime.

#![warn(missing_docs, clippy::pedantic)]

mod descriptor;
mod error;
mod redact;
mod result;
mod schema;

/// Capability descriptors, handlers, and argument-conversion helpers.
pub use descriptor::{
    CapabilityDescriptor, CapabilityDescriptorBuilder, CapabilityInfo, Handler, HandlerError,
    HandlerOutput, extract_arg, extract_optional_arg, into_value,
};
/// Error type and result alias shared across the capability runtime.
pub use error::{Error, Result};
/// Argument redaction for log safety.
pub use redact::{REDACTION_MARKER, redact_arguments};
/// Uniform invocation result envelope.
pub use result::InvocationResult;
/// Parameter schemas and validation.
pub use schema::{Arguments, ParamField, ParamSchema, ParamSchemaBuilder, ParamType};

/// Re-export used by `#[capability]`-generated bindings for default values.
pub use serde_json::json;
