//! The capability registry: name-to-descriptor table and invocation
//! pipelines.

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use capability_primitives::{
    Arguments, CapabilityDescriptor, CapabilityInfo, Handler, HandlerOutput, InvocationResult,
    redact_arguments,
};
use futures::FutureExt;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::dispatch::{DedicatedRuntime, ExecutionContext, panic_message, run_sync_handler};
use crate::error::{RegistryError, RegistryResult};

/// In-process table of named capabilities with uniform invocation.
///
/// The table is expected to be populated during setup and read-heavy
/// afterwards. Registration racing an in-flight invocation of the same name
/// is unsupported: the lock protects map integrity only, and a running call
/// keeps its own handle to the descriptor it resolved.
pub struct CapabilityRegistry {
    inner: RwLock<HashMap<String, Arc<CapabilityDescriptor>>>,
    config: RegistryConfig,
    execution: Arc<dyn ExecutionContext>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("registered", &self.list())
            .finish()
    }
}

impl CapabilityRegistry {
    /// Creates an empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the supplied configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            config,
            execution: Arc::new(DedicatedRuntime),
        }
    }

    /// Replaces the execution context that drives async handlers on behalf of
    /// blocking call sites.
    #[must_use]
    pub fn with_execution_context(mut self, execution: Arc<dyn ExecutionContext>) -> Self {
        self.execution = execution;
        self
    }

    /// Registers a capability.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCapability`] when the name is
    /// already taken; the table is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn register(&self, descriptor: CapabilityDescriptor) -> RegistryResult<()> {
        let mut inner = self.inner.write().expect("capability registry poisoned");
        let name = descriptor.name().to_owned();
        if inner.contains_key(&name) {
            return Err(RegistryError::DuplicateCapability { name });
        }
        inner.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Registers every descriptor in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RegistryError::DuplicateCapability`];
    /// descriptors registered before it stay registered.
    pub fn register_all<I>(&self, descriptors: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = CapabilityDescriptor>,
    {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Registers descriptors under `prefix`-namespaced names, grouping
    /// capabilities by provider.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RegistryError::DuplicateCapability`].
    pub fn register_prefixed<I>(&self, prefix: &str, descriptors: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = CapabilityDescriptor>,
    {
        for descriptor in descriptors {
            self.register(descriptor.with_name_prefix(prefix))?;
        }
        Ok(())
    }

    /// Removes a capability.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownCapability`] when `name` is not
    /// registered.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn unregister(&self, name: &str) -> RegistryResult<()> {
        let mut inner = self.inner.write().expect("capability registry poisoned");
        inner
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::UnknownCapability {
                name: name.to_owned(),
            })
    }

    /// Removes every registration.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn clear(&self) {
        self.inner
            .write()
            .expect("capability registry poisoned")
            .clear();
    }

    /// Returns whether `name` is registered.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.inner
            .read()
            .expect("capability registry poisoned")
            .contains_key(name)
    }

    /// Returns the descriptor registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownCapability`] when `name` is not
    /// registered.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn get(&self, name: &str) -> RegistryResult<Arc<CapabilityDescriptor>> {
        self.inner
            .read()
            .expect("capability registry poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownCapability {
                name: name.to_owned(),
            })
    }

    /// Registered names, sorted alphabetically.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let inner = self.inner.read().expect("capability registry poisoned");
        let mut names: Vec<String> = inner.keys().cloned().collect();
        names.sort();
        names
    }

    /// Serializable capability manifest, sorted by name, for advertising the
    /// registered capabilities to consumers such as LLM function-calling
    /// APIs.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn manifest(&self) -> Vec<CapabilityInfo> {
        let inner = self.inner.read().expect("capability registry poisoned");
        let mut infos: Vec<CapabilityInfo> =
            inner.values().map(|descriptor| descriptor.info()).collect();
        infos.sort_by(|a, b| a.name().cmp(b.name()));
        infos
    }

    /// Invokes a capability from an asynchronous call site.
    ///
    /// Sync handlers are called inline (or on the blocking pool when
    /// [`RegistryConfig::with_offload_sync_handlers`] is set); async handlers
    /// are awaited directly. Schema rejections and handler failures come back
    /// inside the result; handler panics are contained.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownCapability`] when `name` is not
    /// registered — the single contract violation in this call.
    pub async fn invoke(&self, name: &str, args: Arguments) -> RegistryResult<InvocationResult> {
        let descriptor = self.get(name)?;
        let redacted = redact_arguments(&args);
        let started = Instant::now();

        let args = match validated(&descriptor, args, &redacted, started) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        let output = match descriptor.handler() {
            Handler::Sync(handler) => {
                if self.config.offload_sync_handlers() {
                    let handler = Arc::clone(handler);
                    match tokio::task::spawn_blocking(move || handler(args)).await {
                        Ok(output) => output,
                        Err(err) => {
                            if err.is_panic() {
                                let payload = err.into_panic();
                                Err(panic_message(payload.as_ref()).into())
                            } else {
                                Err("handler task cancelled".into())
                            }
                        }
                    }
                } else {
                    run_sync_handler(handler, args)
                }
            }
            Handler::Async(handler) => {
                match AssertUnwindSafe(handler(args)).catch_unwind().await {
                    Ok(output) => output,
                    Err(payload) => Err(panic_message(payload.as_ref()).into()),
                }
            }
        };

        Ok(completed(descriptor.name(), &redacted, output, started))
    }

    /// Invokes a capability from a synchronous call site.
    ///
    /// Sync handlers run on the calling thread. Async handlers are driven to
    /// completion by the execution context: on a fresh runtime when no tokio
    /// runtime is running on this thread, or on a dedicated worker thread
    /// with its own runtime when one is — so this call never raises a
    /// "runtime already running" error and never silently drops the call.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownCapability`] when `name` is not
    /// registered.
    pub fn invoke_blocking(&self, name: &str, args: Arguments) -> RegistryResult<InvocationResult> {
        let descriptor = self.get(name)?;
        let redacted = redact_arguments(&args);
        let started = Instant::now();

        let args = match validated(&descriptor, args, &redacted, started) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        let output = match descriptor.handler() {
            Handler::Sync(handler) => run_sync_handler(handler, args),
            Handler::Async(handler) => self.execution.run_to_completion(handler(args)),
        };

        Ok(completed(descriptor.name(), &redacted, output, started))
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Validates and normalizes the arguments, or produces (and logs) the
/// failure result. Bad input is an expected runtime condition, never raised.
fn validated(
    descriptor: &CapabilityDescriptor,
    args: Arguments,
    redacted: &Arguments,
    started: Instant,
) -> Result<Arguments, InvocationResult> {
    match descriptor.schema().validate(&args) {
        Ok(()) => Ok(descriptor.schema().normalize(args)),
        Err(violations) => {
            let result = InvocationResult::fail(
                format!("Schema validation error: {}", violations.join("; ")),
                elapsed_ms(started),
            );
            log_invocation(descriptor.name(), redacted, &result, "ValidationError");
            Err(result)
        }
    }
}

/// Folds the handler output into a result and emits the per-call log record.
fn completed(
    name: &str,
    redacted: &Arguments,
    output: HandlerOutput,
    started: Instant,
) -> InvocationResult {
    let duration_ms = elapsed_ms(started);
    match output {
        Ok(data) => {
            let result = InvocationResult::ok(data, duration_ms);
            log_invocation(name, redacted, &result, "HandlerError");
            result
        }
        Err(err) => {
            let result = InvocationResult::fail(format!("Handler error: {err}"), duration_ms);
            log_invocation(name, redacted, &result, "HandlerError");
            result
        }
    }
}

/// Exactly one structured record per invocation that reached validation.
fn log_invocation(
    name: &str,
    redacted: &Arguments,
    result: &InvocationResult,
    error_type: &str,
) {
    let inputs = Value::Object(redacted.clone());
    let duration_ms = result.duration_ms().round();
    if result.is_success() {
        info!(
            capability = name,
            inputs = %inputs,
            success = true,
            duration_ms,
            "capability invoked"
        );
    } else {
        warn!(
            capability = name,
            inputs = %inputs,
            success = false,
            duration_ms,
            error_type,
            error_message = result.error().unwrap_or_default(),
            "capability invocation failed"
        );
    }
}
