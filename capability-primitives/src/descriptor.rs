//! Capability descriptors and handler wrappers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{Arguments, ParamSchema};

/// Error type produced by capability handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Output of a single handler call.
pub type HandlerOutput = std::result::Result<Value, HandlerError>;

type SyncFn = dyn Fn(Arguments) -> HandlerOutput + Send + Sync;
type AsyncFn = dyn Fn(Arguments) -> BoxFuture<'static, HandlerOutput> + Send + Sync;

/// Executable body of a capability.
///
/// The variant is fixed once at wrap time from the function's actual nature;
/// the registry branches on the tag instead of re-inspecting per call.
#[derive(Clone)]
pub enum Handler {
    /// Runs to completion on the thread that calls it.
    Sync(Arc<SyncFn>),
    /// Produces a future that must be awaited.
    Async(Arc<AsyncFn>),
}

impl Handler {
    /// Wraps a synchronous function.
    pub fn from_sync<F>(handler: F) -> Self
    where
        F: Fn(Arguments) -> HandlerOutput + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(handler))
    }

    /// Wraps an asynchronous function.
    pub fn from_async<F, Fut>(handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerOutput> + Send + 'static,
    {
        Self::Async(Arc::new(move |args| Box::pin(handler(args))))
    }

    /// Returns whether invoking this handler yields a future.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// Static definition of one capability: name, description, parameter schema,
/// and handler.
///
/// Immutable after construction; cloning shares the handler.
#[derive(Clone, Debug)]
pub struct CapabilityDescriptor {
    name: String,
    description: String,
    schema: ParamSchema,
    handler: Handler,
}

impl CapabilityDescriptor {
    /// Starts building a descriptor registered under `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CapabilityDescriptorBuilder {
        CapabilityDescriptorBuilder {
            name: name.into(),
            description: None,
            schema: ParamSchema::empty(),
            handler: None,
        }
    }

    /// Returns the unique capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameter schema.
    #[must_use]
    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns whether the handler is asynchronous.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.handler.is_async()
    }

    /// Derives a copy registered under `prefix` followed by the current name,
    /// for namespacing capabilities by provider.
    #[must_use]
    pub fn with_name_prefix(&self, prefix: &str) -> Self {
        let mut renamed = self.clone();
        renamed.name = format!("{prefix}{}", self.name);
        renamed
    }

    /// Serializable projection advertised to capability consumers.
    #[must_use]
    pub fn info(&self) -> CapabilityInfo {
        CapabilityInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.to_json_schema(),
        }
    }
}

/// Builder for [`CapabilityDescriptor`].
pub struct CapabilityDescriptorBuilder {
    name: String,
    description: Option<String>,
    schema: ParamSchema,
    handler: Option<Handler>,
}

impl CapabilityDescriptorBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the parameter schema. Defaults to the empty schema.
    #[must_use]
    pub fn schema(mut self, schema: ParamSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets a synchronous handler.
    #[must_use]
    pub fn handler_sync<F>(self, handler: F) -> Self
    where
        F: Fn(Arguments) -> HandlerOutput + Send + Sync + 'static,
    {
        self.handler(Handler::from_sync(handler))
    }

    /// Sets an asynchronous handler.
    #[must_use]
    pub fn handler_async<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerOutput> + Send + 'static,
    {
        self.handler(Handler::from_async(handler))
    }

    /// Finalizes the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] when the name or description is
    /// empty or no handler was supplied. These are setup mistakes, raised
    /// eagerly rather than folded into an invocation result.
    pub fn build(self) -> Result<CapabilityDescriptor> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: "name cannot be empty".into(),
            });
        }
        let description = self.description.unwrap_or_default();
        if description.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: "description cannot be empty".into(),
            });
        }
        let handler = self.handler.ok_or_else(|| Error::InvalidDescriptor {
            reason: "handler must be provided".into(),
        })?;
        Ok(CapabilityDescriptor {
            name: self.name,
            description,
            schema: self.schema,
            handler,
        })
    }
}

/// Serializable projection of a descriptor: name, description, and the
/// JSON-Schema rendering of its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapabilityInfo {
    name: String,
    description: String,
    parameters: Value,
}

impl CapabilityInfo {
    /// Returns the capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON-Schema rendering of the parameter schema.
    #[must_use]
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }
}

/// Deserializes the argument `name` from a normalized argument map.
///
/// Intended for handler bindings generated by the `#[capability]` attribute.
///
/// # Errors
///
/// Returns a [`HandlerError`] when the argument is absent or cannot be
/// deserialized into `T`.
pub fn extract_arg<T>(args: &Arguments, name: &str) -> std::result::Result<T, HandlerError>
where
    T: serde::de::DeserializeOwned,
{
    let value = args
        .get(name)
        .ok_or_else(|| format!("missing argument `{name}`"))?;
    serde_json::from_value(value.clone()).map_err(|err| format!("argument `{name}`: {err}").into())
}

/// Deserializes the optional argument `name`; an absent or `null` value maps
/// to `None`.
///
/// # Errors
///
/// Returns a [`HandlerError`] when a present value cannot be deserialized
/// into `T`.
pub fn extract_optional_arg<T>(
    args: &Arguments,
    name: &str,
) -> std::result::Result<Option<T>, HandlerError>
where
    T: serde::de::DeserializeOwned,
{
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| format!("argument `{name}`: {err}").into()),
    }
}

/// Serializes a handler's return value into the result payload.
///
/// # Errors
///
/// Returns a [`HandlerError`] when the value cannot be represented as JSON.
pub fn into_value<T>(value: T) -> std::result::Result<Value, HandlerError>
where
    T: Serialize,
{
    serde_json::to_value(value).map_err(|err| format!("serializing handler output: {err}").into())
}
