//! Tracing-based observability hooks for the chat lifecycle and adapter engines.
//!
//! ```rust
//! use hobserve::TracingObservabilityHooks;
//! use hchat::ChatLifecycleHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatLifecycleHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_chat_hooks(&hooks);
//! ```

use hchat::{
    ChatLifecycleHooks, ChatSettings, ConnectivityState, Notice, NoticeLevel, StoreError,
    TurnOutcome,
};
use hprovider::{AdapterHooks, ProviderError, ProviderKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ChatLifecycleHooks for TracingObservabilityHooks {
    fn on_turn_started(&self, provider: ProviderKind) {
        tracing::info!(phase = "chat", event = "turn_started", provider = %provider);
    }

    fn on_turn_completed(&self, outcome: &TurnOutcome) {
        tracing::info!(
            phase = "chat",
            event = "turn_completed",
            provider = %outcome.provider,
            reply_chars = outcome.turn.content.chars().count() as u64
        );
    }

    fn on_turn_failed(&self, provider: ProviderKind, error: &ProviderError) {
        tracing::error!(
            phase = "chat",
            event = "turn_failed",
            provider = %provider,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_transcript_cleared(&self) {
        tracing::info!(phase = "chat", event = "transcript_cleared");
    }

    fn on_selection_changed(&self, settings: &ChatSettings) {
        tracing::info!(
            phase = "chat",
            event = "selection_changed",
            provider = %settings.provider,
            server_model = settings.server.model,
            engine_model = settings.engine.model
        );
    }

    fn on_connectivity_changed(&self, state: ConnectivityState) {
        tracing::info!(phase = "chat", event = "connectivity_changed", state = ?state);
    }

    fn on_notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => {
                tracing::info!(
                    phase = "chat",
                    event = "notice",
                    title = notice.title,
                    text = notice.message
                );
            }
            NoticeLevel::Warning => {
                tracing::warn!(
                    phase = "chat",
                    event = "notice",
                    title = notice.title,
                    text = notice.message
                );
            }
            NoticeLevel::Error => {
                tracing::error!(
                    phase = "chat",
                    event = "notice",
                    title = notice.title,
                    text = notice.message
                );
            }
        }
    }

    fn on_store_degraded(&self, error: &StoreError) {
        tracing::warn!(
            phase = "chat",
            event = "store_degraded",
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl AdapterHooks for TracingObservabilityHooks {
    fn on_engine_build_started(&self, model: &str) {
        tracing::info!(phase = "adapter", event = "engine_build_started", model);
    }

    fn on_engine_load_progress(&self, model: &str, fraction: f32) {
        tracing::debug!(
            phase = "adapter",
            event = "engine_load_progress",
            model,
            fraction
        );
    }

    fn on_engine_ready(&self, model: &str) {
        tracing::info!(phase = "adapter", event = "engine_ready", model);
    }

    fn on_engine_discarded(&self, model: &str, reason: &str) {
        tracing::info!(phase = "adapter", event = "engine_discarded", model, reason);
    }

    fn on_stream_fallback(&self, provider: ProviderKind, error: &ProviderError) {
        tracing::warn!(
            phase = "adapter",
            event = "stream_fallback",
            provider = %provider,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}
