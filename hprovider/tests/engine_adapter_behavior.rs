#![cfg(feature = "adapter-engine")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use hcommon::SamplingOptions;
use hprovider::adapters::engine::{
    EngineInstance, EngineLoadReport, EngineLoadStream, EngineRuntime, EngineTokenStream,
    LocalEngineAdapter,
};
use hprovider::catalog::{DEFAULT_ENGINE_MODEL, ModelCatalogEntry};
use hprovider::{
    AdapterHooks, BoxedDispatchStream, DispatchEvent, DispatchRequest, EngineFault, LoadStage,
    LocalEngineConfig, ProviderAdapter, ProviderConfig, ProviderError, ProviderErrorKind,
    ProviderFuture, Turn,
};

struct FakeInstance {
    loads: Vec<Result<EngineLoadReport, EngineFault>>,
    token_scripts: Vec<Vec<Result<String, EngineFault>>>,
}

impl FakeInstance {
    fn new(
        loads: Vec<Result<EngineLoadReport, EngineFault>>,
        token_scripts: Vec<Vec<Result<String, EngineFault>>>,
    ) -> Self {
        Self {
            loads,
            token_scripts,
        }
    }
}

impl EngineInstance for FakeInstance {
    fn load<'a>(&'a mut self) -> EngineLoadStream<'a> {
        let loads = std::mem::take(&mut self.loads);
        Box::pin(futures_util::stream::iter(loads))
    }

    fn generate<'a>(
        &'a mut self,
        _transcript: &'a [Turn],
    ) -> ProviderFuture<'a, Result<EngineTokenStream<'a>, EngineFault>> {
        Box::pin(async move {
            if self.token_scripts.is_empty() {
                return Err(EngineFault::new("no scripted generation left"));
            }

            let tokens = self.token_scripts.remove(0);
            Ok(Box::pin(futures_util::stream::iter(tokens)) as EngineTokenStream<'a>)
        })
    }
}

#[derive(Default)]
struct FakeRuntime {
    instances: Mutex<Vec<FakeInstance>>,
    build_faults: Mutex<Vec<EngineFault>>,
    builds: AtomicUsize,
    captured_model: Mutex<Option<String>>,
    captured_sampling: Mutex<Option<SamplingOptions>>,
}

impl EngineRuntime for FakeRuntime {
    fn build<'a>(
        &'a self,
        model: &'static ModelCatalogEntry,
        sampling: SamplingOptions,
    ) -> ProviderFuture<'a, Result<Box<dyn EngineInstance>, EngineFault>> {
        Box::pin(async move {
            self.builds.fetch_add(1, Ordering::SeqCst);
            *self.captured_model.lock().expect("model lock") = Some(model.id.to_string());
            *self.captured_sampling.lock().expect("sampling lock") = Some(sampling);

            if let Some(fault) = self.build_faults.lock().expect("faults lock").pop() {
                return Err(fault);
            }

            let mut instances = self.instances.lock().expect("instances lock");
            if instances.is_empty() {
                return Err(EngineFault::new("no scripted instance left"));
            }

            Ok(Box::new(instances.remove(0)) as Box<dyn EngineInstance>)
        })
    }
}

#[derive(Default)]
struct RecordingHooks {
    progress: Mutex<Vec<f32>>,
    ready: Mutex<Vec<String>>,
    discards: Mutex<Vec<(String, String)>>,
}

impl AdapterHooks for RecordingHooks {
    fn on_engine_load_progress(&self, _model: &str, fraction: f32) {
        self.progress.lock().expect("progress lock").push(fraction);
    }

    fn on_engine_ready(&self, model: &str) {
        self.ready.lock().expect("ready lock").push(model.to_string());
    }

    fn on_engine_discarded(&self, model: &str, reason: &str) {
        self.discards
            .lock()
            .expect("discards lock")
            .push((model.to_string(), reason.to_string()));
    }
}

fn engine_request(model: &str) -> DispatchRequest {
    DispatchRequest::new(
        vec![Turn::user("hi")],
        ProviderConfig::LocalEngine(LocalEngineConfig {
            model: model.to_string(),
            temperature: 0.4,
        }),
    )
}

fn ok_tokens(tokens: &[&str]) -> Vec<Result<String, EngineFault>> {
    tokens.iter().map(|token| Ok(token.to_string())).collect()
}

async fn collect(
    mut stream: BoxedDispatchStream<'_>,
) -> (Vec<DispatchEvent>, Option<ProviderError>) {
    let mut events = Vec::new();
    let mut error = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => events.push(event),
            Err(err) => {
                error = Some(err);
                break;
            }
        }
    }

    (events, error)
}

fn progress_fractions(events: &[DispatchEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            DispatchEvent::Progress(progress) => Some(progress.fraction),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn first_dispatch_builds_loads_and_streams() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime.instances.lock().expect("instances lock").push(FakeInstance::new(
        vec![
            Ok(EngineLoadReport::at(0.0).with_note("resolving weights")),
            Ok(EngineLoadReport::at(0.5)),
            Ok(EngineLoadReport::at(1.0)),
        ],
        vec![ok_tokens(&["你", "好"])],
    ));

    let adapter = LocalEngineAdapter::new(runtime.clone());
    let (events, error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;

    assert!(error.is_none(), "unexpected error: {error:?}");
    assert_eq!(progress_fractions(&events), vec![0.0, 0.5, 1.0]);

    let stages: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            DispatchEvent::Progress(progress) => Some(progress.stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![LoadStage::Preparing, LoadStage::Downloading, LoadStage::Complete]
    );

    assert!(events.contains(&DispatchEvent::ContentDelta("你".to_string())));
    assert_eq!(
        events.last(),
        Some(&DispatchEvent::Complete(Turn::assistant("你好")))
    );

    assert_eq!(runtime.builds.load(Ordering::SeqCst), 1);
    assert_eq!(
        runtime.captured_model.lock().expect("model lock").as_deref(),
        Some(DEFAULT_ENGINE_MODEL)
    );

    // The dispatch temperature overrides the catalog recommendation;
    // the rest of the recommended sampling is kept.
    let sampling = runtime
        .captured_sampling
        .lock()
        .expect("sampling lock")
        .expect("sampling should be captured");
    assert_eq!(sampling.temperature, Some(0.4));
    assert_eq!(sampling.top_p, Some(0.8));
}

#[tokio::test]
async fn second_dispatch_reuses_the_loaded_engine() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime.instances.lock().expect("instances lock").push(FakeInstance::new(
        vec![Ok(EngineLoadReport::at(1.0))],
        vec![ok_tokens(&["first"]), ok_tokens(&["second"])],
    ));

    let adapter = LocalEngineAdapter::new(runtime.clone());

    let (_, first_error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;
    assert!(first_error.is_none());
    assert!(adapter.is_loaded());

    let (events, error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;
    assert!(error.is_none());
    assert_eq!(runtime.builds.load(Ordering::SeqCst), 1);
    assert!(progress_fractions(&events).is_empty());
    assert_eq!(
        events.last(),
        Some(&DispatchEvent::Complete(Turn::assistant("second")))
    );
}

#[tokio::test]
async fn model_change_discards_the_old_engine_and_rebuilds() {
    let runtime = Arc::new(FakeRuntime::default());
    {
        let mut instances = runtime.instances.lock().expect("instances lock");
        instances.push(FakeInstance::new(
            vec![Ok(EngineLoadReport::at(1.0))],
            vec![ok_tokens(&["a"])],
        ));
        instances.push(FakeInstance::new(
            vec![Ok(EngineLoadReport::at(1.0))],
            vec![ok_tokens(&["b"])],
        ));
    }

    let hooks = Arc::new(RecordingHooks::default());
    let adapter = LocalEngineAdapter::with_hooks(runtime.clone(), hooks.clone());

    let (_, first_error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;
    assert!(first_error.is_none());

    let (events, error) =
        collect(adapter.dispatch(engine_request("SmolLM2-135M-Instruct-q0f16-MLC"))).await;
    assert!(error.is_none());
    assert_eq!(runtime.builds.load(Ordering::SeqCst), 2);
    assert!(!progress_fractions(&events).is_empty());

    let discards = hooks.discards.lock().expect("discards lock");
    assert_eq!(
        discards.as_slice(),
        [(DEFAULT_ENGINE_MODEL.to_string(), "model changed".to_string())]
    );
}

#[tokio::test]
async fn unknown_models_fail_before_building() {
    let runtime = Arc::new(FakeRuntime::default());
    let adapter = LocalEngineAdapter::new(runtime.clone());

    let (events, error) = collect(adapter.dispatch(engine_request("Qwen9000-MLC"))).await;

    assert!(events.is_empty());
    assert_eq!(
        error.expect("unknown model should fail").kind,
        ProviderErrorKind::ModelNotFound
    );
    assert_eq!(runtime.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn build_faults_are_classified_from_their_message() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime
        .build_faults
        .lock()
        .expect("faults lock")
        .push(EngineFault::new("WebGPU is not supported on this device"));

    let adapter = LocalEngineAdapter::new(runtime);
    let (events, error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;

    assert!(events.is_empty());
    assert_eq!(
        error.expect("build should fail").kind,
        ProviderErrorKind::EngineUnavailable
    );
    assert!(!adapter.is_loaded());
}

#[tokio::test]
async fn generation_faults_discard_the_instance() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime.instances.lock().expect("instances lock").push(FakeInstance::new(
        vec![Ok(EngineLoadReport::at(1.0))],
        vec![vec![
            Ok("部".to_string()),
            Err(EngineFault::new("device lost during decode")),
        ]],
    ));

    let hooks = Arc::new(RecordingHooks::default());
    let adapter = LocalEngineAdapter::with_hooks(runtime, hooks.clone());
    let (events, error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;

    assert!(events.contains(&DispatchEvent::ContentDelta("部".to_string())));
    assert!(!events.iter().any(|event| matches!(event, DispatchEvent::Complete(_))));
    assert_eq!(
        error.expect("generation should fail").kind,
        ProviderErrorKind::DeviceLost
    );
    assert!(!adapter.is_loaded());

    let discards = hooks.discards.lock().expect("discards lock");
    assert_eq!(discards.len(), 1);
    assert_eq!(discards[0].1, "device lost during decode");
}

#[tokio::test]
async fn loads_without_a_final_report_synthesize_completion() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime.instances.lock().expect("instances lock").push(FakeInstance::new(
        vec![Ok(EngineLoadReport::at(0.3))],
        vec![ok_tokens(&["x"])],
    ));

    let adapter = LocalEngineAdapter::new(runtime);
    let (events, error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;

    assert!(error.is_none());
    assert_eq!(progress_fractions(&events), vec![0.3, 1.0]);
}

#[tokio::test]
async fn reset_discards_the_resident_engine() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime.instances.lock().expect("instances lock").push(FakeInstance::new(
        vec![Ok(EngineLoadReport::at(1.0))],
        vec![ok_tokens(&["hi"])],
    ));

    let hooks = Arc::new(RecordingHooks::default());
    let adapter = LocalEngineAdapter::with_hooks(runtime, hooks.clone());

    let (_, error) = collect(adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL))).await;
    assert!(error.is_none());
    assert!(adapter.is_loaded());

    adapter.reset().await;
    assert!(!adapter.is_loaded());

    let discards = hooks.discards.lock().expect("discards lock");
    assert_eq!(
        discards.as_slice(),
        [(DEFAULT_ENGINE_MODEL.to_string(), "reset".to_string())]
    );
}

#[tokio::test]
async fn reset_during_a_dispatch_prevents_the_engine_from_surviving() {
    let runtime = Arc::new(FakeRuntime::default());
    runtime.instances.lock().expect("instances lock").push(FakeInstance::new(
        vec![Ok(EngineLoadReport::at(1.0))],
        vec![ok_tokens(&["token"])],
    ));

    let hooks = Arc::new(RecordingHooks::default());
    let adapter = LocalEngineAdapter::with_hooks(runtime, hooks.clone());

    let mut stream = adapter.dispatch(engine_request(DEFAULT_ENGINE_MODEL));

    // Drain up to the first content delta, then reset mid-flight.
    loop {
        let item = stream.next().await.expect("stream should not end yet");
        if matches!(item, Ok(DispatchEvent::ContentDelta(_))) {
            break;
        }
    }

    adapter.reset().await;

    while let Some(item) = stream.next().await {
        item.expect("dispatch should still complete");
    }

    assert!(!adapter.is_loaded());
    let discards = hooks.discards.lock().expect("discards lock");
    assert!(
        discards
            .iter()
            .any(|(_, reason)| reason == "reset during dispatch"),
        "discards: {discards:?}"
    );
}
