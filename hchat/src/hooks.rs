//! Observation hooks for the chat lifecycle.

use hprovider::{ProviderError, ProviderKind};

use crate::store::StoreError;
use crate::types::{ChatSettings, ConnectivityState, Notice, TurnOutcome};

/// Callbacks the controller fires as turns and settings move through
/// their lifecycle. Every method has an empty default body, so an
/// implementation only overrides what it cares about.
///
/// Hooks run synchronously on the dispatching task and must not block.
pub trait ChatLifecycleHooks: Send + Sync {
    fn on_turn_started(&self, _provider: ProviderKind) {}

    fn on_turn_completed(&self, _outcome: &TurnOutcome) {}

    fn on_turn_failed(&self, _provider: ProviderKind, _error: &ProviderError) {}

    fn on_transcript_cleared(&self) {}

    fn on_selection_changed(&self, _settings: &ChatSettings) {}

    fn on_connectivity_changed(&self, _state: ConnectivityState) {}

    fn on_notice(&self, _notice: &Notice) {}

    /// A persistence call failed and was absorbed. In-memory state is
    /// ahead of the stores until the next successful save.
    fn on_store_degraded(&self, _error: &StoreError) {}
}

/// Hook implementation that observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatHooks;

impl ChatLifecycleHooks for NoopChatHooks {}
