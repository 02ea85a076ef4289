//! Operational hook contract for adapter lifecycle observation.

use crate::{ProviderError, ProviderKind};

/// Hooks adapters call as their engine instances move through their
/// lifecycle. Every method has an empty default body so implementors
/// override only what they observe.
pub trait AdapterHooks: Send + Sync {
    fn on_engine_build_started(&self, _model: &str) {}

    fn on_engine_load_progress(&self, _model: &str, _fraction: f32) {}

    fn on_engine_ready(&self, _model: &str) {}

    fn on_engine_discarded(&self, _model: &str, _reason: &str) {}

    /// The streaming path failed and the adapter is about to retry with
    /// a single non-streaming call. The error passed here is otherwise
    /// swallowed when the fallback succeeds.
    fn on_stream_fallback(&self, _provider: ProviderKind, _error: &ProviderError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdapterHooks;

impl AdapterHooks for NoopAdapterHooks {}
