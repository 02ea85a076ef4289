use std::sync::{Arc, Mutex};

use hchat::{ChatLifecycleHooks, ChatSettings, ConnectivityState, Notice, StoreError, TurnOutcome};
use hprovider::{AdapterHooks, ProviderError, ProviderKind, Turn};

use crate::{
    MetricsObservabilityHooks, SafeAdapterHooks, SafeChatHooks, TracingObservabilityHooks,
};

const ENGINE_MODEL: &str = "Qwen2.5-0.5B-Instruct-q4f16_1-MLC";

fn sample_outcome() -> TurnOutcome {
    TurnOutcome {
        provider: ProviderKind::HttpServer,
        turn: Turn::assistant("The answer is 4."),
    }
}

fn drive_chat_callbacks(hooks: &dyn ChatLifecycleHooks) {
    let provider_error = ProviderError::endpoint_unreachable("connection refused");
    let store_error = StoreError::write("disk full");

    hooks.on_turn_started(ProviderKind::HttpServer);
    hooks.on_turn_completed(&sample_outcome());
    hooks.on_turn_failed(ProviderKind::HttpServer, &provider_error);
    hooks.on_transcript_cleared();
    hooks.on_selection_changed(&ChatSettings::default());
    hooks.on_connectivity_changed(ConnectivityState::Connected);
    hooks.on_notice(&Notice::warning("The model server connection was interrupted."));
    hooks.on_store_degraded(&store_error);
}

fn drive_adapter_callbacks(hooks: &dyn AdapterHooks) {
    let provider_error = ProviderError::device_lost("GPU device lost");

    hooks.on_engine_build_started(ENGINE_MODEL);
    hooks.on_engine_load_progress(ENGINE_MODEL, 0.5);
    hooks.on_engine_ready(ENGINE_MODEL);
    hooks.on_engine_discarded(ENGINE_MODEL, "provider switched");
    hooks.on_stream_fallback(ProviderKind::LocalEngine, &provider_error);
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;

    drive_chat_callbacks(&hooks);
    drive_adapter_callbacks(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;

    drive_chat_callbacks(&hooks);
    drive_adapter_callbacks(&hooks);
}

#[derive(Default, Clone)]
struct RecordingChatHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl ChatLifecycleHooks for RecordingChatHooks {
    fn on_turn_started(&self, _provider: ProviderKind) {
        self.events.lock().expect("events lock").push("turn_started");
    }

    fn on_turn_completed(&self, _outcome: &TurnOutcome) {
        self.events
            .lock()
            .expect("events lock")
            .push("turn_completed");
    }

    fn on_turn_failed(&self, _provider: ProviderKind, _error: &ProviderError) {
        self.events.lock().expect("events lock").push("turn_failed");
    }

    fn on_transcript_cleared(&self) {
        self.events.lock().expect("events lock").push("cleared");
    }

    fn on_selection_changed(&self, _settings: &ChatSettings) {
        self.events.lock().expect("events lock").push("selection");
    }

    fn on_connectivity_changed(&self, _state: ConnectivityState) {
        self.events
            .lock()
            .expect("events lock")
            .push("connectivity");
    }

    fn on_notice(&self, _notice: &Notice) {
        self.events.lock().expect("events lock").push("notice");
    }

    fn on_store_degraded(&self, _error: &StoreError) {
        self.events.lock().expect("events lock").push("degraded");
    }
}

#[derive(Default, Clone)]
struct RecordingAdapterHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl AdapterHooks for RecordingAdapterHooks {
    fn on_engine_build_started(&self, _model: &str) {
        self.events.lock().expect("events lock").push("build");
    }

    fn on_engine_load_progress(&self, _model: &str, _fraction: f32) {
        self.events.lock().expect("events lock").push("progress");
    }

    fn on_engine_ready(&self, _model: &str) {
        self.events.lock().expect("events lock").push("ready");
    }

    fn on_engine_discarded(&self, _model: &str, _reason: &str) {
        self.events.lock().expect("events lock").push("discarded");
    }

    fn on_stream_fallback(&self, _provider: ProviderKind, _error: &ProviderError) {
        self.events.lock().expect("events lock").push("fallback");
    }
}

struct PanicChatHooks;

impl ChatLifecycleHooks for PanicChatHooks {
    fn on_turn_started(&self, _provider: ProviderKind) {
        panic!("turn_started panic");
    }

    fn on_turn_completed(&self, _outcome: &TurnOutcome) {
        panic!("turn_completed panic");
    }

    fn on_turn_failed(&self, _provider: ProviderKind, _error: &ProviderError) {
        panic!("turn_failed panic");
    }

    fn on_transcript_cleared(&self) {
        panic!("transcript_cleared panic");
    }

    fn on_selection_changed(&self, _settings: &ChatSettings) {
        panic!("selection_changed panic");
    }

    fn on_connectivity_changed(&self, _state: ConnectivityState) {
        panic!("connectivity_changed panic");
    }

    fn on_notice(&self, _notice: &Notice) {
        panic!("notice panic");
    }

    fn on_store_degraded(&self, _error: &StoreError) {
        panic!("store_degraded panic");
    }
}

struct PanicAdapterHooks;

impl AdapterHooks for PanicAdapterHooks {
    fn on_engine_build_started(&self, _model: &str) {
        panic!("build panic");
    }

    fn on_engine_load_progress(&self, _model: &str, _fraction: f32) {
        panic!("progress panic");
    }

    fn on_engine_ready(&self, _model: &str) {
        panic!("ready panic");
    }

    fn on_engine_discarded(&self, _model: &str, _reason: &str) {
        panic!("discarded panic");
    }

    fn on_stream_fallback(&self, _provider: ProviderKind, _error: &ProviderError) {
        panic!("fallback panic");
    }
}

#[test]
fn safe_chat_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingChatHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeChatHooks::new(inner);

    drive_chat_callbacks(&hooks);

    assert_eq!(events.lock().expect("events lock").len(), 8);
}

#[test]
fn safe_adapter_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingAdapterHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeAdapterHooks::new(inner);

    drive_adapter_callbacks(&hooks);

    assert_eq!(events.lock().expect("events lock").len(), 5);
}

#[test]
fn safe_chat_hooks_swallow_panics() {
    let hooks = SafeChatHooks::new(PanicChatHooks);

    drive_chat_callbacks(&hooks);
}

#[test]
fn safe_adapter_hooks_swallow_panics() {
    let hooks = SafeAdapterHooks::new(PanicAdapterHooks);

    drive_adapter_callbacks(&hooks);
}
