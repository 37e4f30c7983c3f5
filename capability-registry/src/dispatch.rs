//! Execution contexts bridging synchronous call sites and async handlers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use capability_primitives::{Arguments, HandlerOutput};
use futures::future::BoxFuture;
use tokio::runtime;

/// Drives an asynchronous handler to completion on behalf of a synchronous
/// caller.
///
/// Injected into the registry so the thread/event-loop strategy can be
/// replaced or instrumented. Implementations must return an output whatever
/// the calling thread's concurrency context: never a "runtime already
/// running" error, never a dropped call, never a deadlock.
pub trait ExecutionContext: Send + Sync {
    /// Blocks the calling thread until the handler future resolves.
    fn run_to_completion(&self, future: BoxFuture<'static, HandlerOutput>) -> HandlerOutput;
}

/// Default execution context.
///
/// Outside a tokio runtime the future runs on a fresh current-thread runtime
/// built for the call. When a runtime is already running on the calling
/// thread, blocking in place would panic, so the future moves to a dedicated
/// thread carrying its own runtime and the caller blocks on the join.
#[derive(Clone, Copy, Debug, Default)]
pub struct DedicatedRuntime;

impl ExecutionContext for DedicatedRuntime {
    fn run_to_completion(&self, future: BoxFuture<'static, HandlerOutput>) -> HandlerOutput {
        if runtime::Handle::try_current().is_ok() {
            match thread::spawn(move || block_on_fresh_runtime(future)).join() {
                Ok(output) => output,
                Err(payload) => Err(panic_message(payload.as_ref()).into()),
            }
        } else {
            block_on_fresh_runtime(future)
        }
    }
}

fn block_on_fresh_runtime(future: BoxFuture<'static, HandlerOutput>) -> HandlerOutput {
    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("building handler runtime: {err}"))?;
    match panic::catch_unwind(AssertUnwindSafe(|| rt.block_on(future))) {
        Ok(output) => output,
        Err(payload) => Err(panic_message(payload.as_ref()).into()),
    }
}

/// Calls a synchronous handler, containing panics.
pub(crate) fn run_sync_handler(
    handler: &Arc<dyn Fn(Arguments) -> HandlerOutput + Send + Sync>,
    args: Arguments,
) -> HandlerOutput {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
        Ok(output) => output,
        Err(payload) => Err(panic_message(payload.as_ref()).into()),
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_owned()
    }
}
