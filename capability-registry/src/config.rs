//! Registry configuration.

/// Tuning knobs for the invocation pipelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryConfig {
    offload_sync_handlers: bool,
}

impl RegistryConfig {
    /// Creates a configuration with defaults: sync handlers run inline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs synchronous handlers on the blocking pool during async
    /// invocation, so a long-running handler cannot stall the event loop.
    ///
    /// Off by default; the blocking pipeline is unaffected either way.
    #[must_use]
    pub fn with_offload_sync_handlers(mut self, offload: bool) -> Self {
        self.offload_sync_handlers = offload;
        self
    }

    /// Returns whether sync handlers are offloaded on the async pipeline.
    #[must_use]
    pub const fn offload_sync_handlers(self) -> bool {
        self.offload_sync_handlers
    }
}
