use std::panic::{AssertUnwindSafe, catch_unwind};

use hchat::{ChatLifecycleHooks, ChatSettings, ConnectivityState, Notice, StoreError, TurnOutcome};
use hprovider::{AdapterHooks, ProviderError, ProviderKind};

pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatLifecycleHooks for SafeChatHooks<H>
where
    H: ChatLifecycleHooks,
{
    fn on_turn_started(&self, provider: ProviderKind) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_turn_started(provider)));
    }

    fn on_turn_completed(&self, outcome: &TurnOutcome) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_turn_completed(outcome)));
    }

    fn on_turn_failed(&self, provider: ProviderKind, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_failed(provider, error)
        }));
    }

    fn on_transcript_cleared(&self) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_transcript_cleared()));
    }

    fn on_selection_changed(&self, settings: &ChatSettings) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_selection_changed(settings)
        }));
    }

    fn on_connectivity_changed(&self, state: ConnectivityState) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_connectivity_changed(state)
        }));
    }

    fn on_notice(&self, notice: &Notice) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_notice(notice)));
    }

    fn on_store_degraded(&self, error: &StoreError) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_store_degraded(error)));
    }
}

pub struct SafeAdapterHooks<H> {
    inner: H,
}

impl<H> SafeAdapterHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> AdapterHooks for SafeAdapterHooks<H>
where
    H: AdapterHooks,
{
    fn on_engine_build_started(&self, model: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_engine_build_started(model)
        }));
    }

    fn on_engine_load_progress(&self, model: &str, fraction: f32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_engine_load_progress(model, fraction)
        }));
    }

    fn on_engine_ready(&self, model: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_engine_ready(model)));
    }

    fn on_engine_discarded(&self, model: &str, reason: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_engine_discarded(model, reason)
        }));
    }

    fn on_stream_fallback(&self, provider: ProviderKind, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_stream_fallback(provider, error)
        }));
    }
}
