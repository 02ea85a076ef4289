//! Metrics-based observability hooks for the chat lifecycle and adapter engines.
//!
//! ```rust
//! use hobserve::MetricsObservabilityHooks;
//! use hprovider::AdapterHooks;
//!
//! fn accepts_adapter_hooks(_hooks: &dyn AdapterHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_adapter_hooks(&hooks);
//! ```

use hchat::{ChatLifecycleHooks, ChatSettings, ConnectivityState, Notice, StoreError, TurnOutcome};
use hprovider::{AdapterHooks, ProviderError, ProviderKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ChatLifecycleHooks for MetricsObservabilityHooks {
    fn on_turn_started(&self, provider: ProviderKind) {
        metrics::counter!(
            "hush_chat_turn_started_total",
            "provider" => provider.to_string()
        )
        .increment(1);
    }

    fn on_turn_completed(&self, outcome: &TurnOutcome) {
        metrics::counter!(
            "hush_chat_turn_completed_total",
            "provider" => outcome.provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "hush_chat_reply_chars",
            "provider" => outcome.provider.to_string()
        )
        .record(outcome.turn.content.chars().count() as f64);
    }

    fn on_turn_failed(&self, provider: ProviderKind, error: &ProviderError) {
        metrics::counter!(
            "hush_chat_turn_failed_total",
            "provider" => provider.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_transcript_cleared(&self) {
        metrics::counter!("hush_chat_transcript_cleared_total").increment(1);
    }

    fn on_selection_changed(&self, settings: &ChatSettings) {
        metrics::counter!(
            "hush_chat_selection_changed_total",
            "provider" => settings.provider.to_string()
        )
        .increment(1);
    }

    fn on_connectivity_changed(&self, state: ConnectivityState) {
        metrics::counter!(
            "hush_chat_connectivity_changed_total",
            "state" => format!("{:?}", state)
        )
        .increment(1);
    }

    fn on_notice(&self, notice: &Notice) {
        metrics::counter!(
            "hush_chat_notice_total",
            "level" => format!("{:?}", notice.level)
        )
        .increment(1);
    }

    fn on_store_degraded(&self, error: &StoreError) {
        metrics::counter!(
            "hush_chat_store_degraded_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}

impl AdapterHooks for MetricsObservabilityHooks {
    fn on_engine_build_started(&self, model: &str) {
        metrics::counter!(
            "hush_engine_build_started_total",
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_engine_load_progress(&self, model: &str, fraction: f32) {
        metrics::gauge!(
            "hush_engine_load_fraction",
            "model" => model.to_string()
        )
        .set(f64::from(fraction));
    }

    fn on_engine_ready(&self, model: &str) {
        metrics::counter!(
            "hush_engine_ready_total",
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_engine_discarded(&self, model: &str, _reason: &str) {
        metrics::counter!(
            "hush_engine_discarded_total",
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_stream_fallback(&self, provider: ProviderKind, error: &ProviderError) {
        metrics::counter!(
            "hush_adapter_stream_fallback_total",
            "provider" => provider.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}
