//! Shared error definitions for capability primitives.

use thiserror::Error;

/// Result alias used throughout the capability runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing descriptors and schemas.
///
/// These indicate programming mistakes in setup code and are always raised.
/// Runtime failures (schema-validation rejections, handler errors) travel
/// inside an [`InvocationResult`](crate::InvocationResult) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Capability descriptor failed validation.
    #[error("invalid capability descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Parameter schema failed validation.
    #[error("invalid parameter schema: {reason}")]
    InvalidSchema {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
