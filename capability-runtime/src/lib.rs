//! Capability registry and invocation engine facade.
//!
//! Depend on this crate via `cargo add capability-runtime`. It bundles the
//! internal crates behind feature flags so downstream users can enable or
//! disable components as needed for their backends.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use capability_primitives as primitives;

/// Capability registry and dispatch (enabled by `registry` feature).
#[cfg(feature = "registry")]
pub use capability_registry as registry;

/// Derive-style capability attribute (enabled by `macros` feature).
#[cfg(feature = "macros")]
pub use capability_macros as macros;

/// Marks a function as a capability and generates a descriptor constructor.
#[cfg(feature = "macros")]
pub use capability_macros::capability;
