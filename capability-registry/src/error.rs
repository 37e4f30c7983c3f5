//! Error definitions for registry operations.

use thiserror::Error;

/// Result alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Contract violations raised by the registry.
///
/// Only setup mistakes are raised: the caller either registered a name twice
/// or invoked a name it never registered. Schema-validation failures and
/// handler errors are reported inside an
/// [`InvocationResult`](capability_primitives::InvocationResult), never
/// raised.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A capability with the same name is already registered.
    #[error("capability `{name}` is already registered")]
    DuplicateCapability {
        /// Name of the colliding capability.
        name: String,
    },

    /// The requested capability does not exist.
    #[error("capability `{name}` is not registered")]
    UnknownCapability {
        /// Name that failed the lookup.
        name: String,
    },
}
