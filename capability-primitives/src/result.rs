//! Uniform invocation result envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one capability invocation.
///
/// Every failure, whatever its origin, surfaces through this same shape so
/// downstream consumers implement exactly one failure-handling path. The
/// factory constructors keep the invariant that `data` is present exactly on
/// success and `error` exactly on failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    duration_ms: f64,
}

impl InvocationResult {
    /// Successful invocation carrying the handler's output.
    #[must_use]
    pub fn ok(data: Value, duration_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            duration_ms,
        }
    }

    /// Failed invocation carrying a human-readable error.
    #[must_use]
    pub fn fail(error: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Returns whether the invocation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the handler output; present exactly when the call succeeded.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Returns the error message; present exactly when the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the wall-clock duration of the call in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}
