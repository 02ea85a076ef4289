//! Adapter for the in-process accelerator engine.
//!
//! The engine downloads model weights on first use and keeps one loaded
//! instance alive between dispatches. A dispatch reuses the instance
//! when the requested model matches, rebuilds it when the model changed,
//! and discards it on any engine fault so the next dispatch starts from
//! a clean build.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use hcommon::SamplingOptions;

use crate::catalog::{self, ModelCatalogEntry};
use crate::{
    AdapterHooks, BoxedDispatchStream, DispatchEvent, DispatchRequest, EngineFault, LoadProgress,
    LocalEngineConfig, NoopAdapterHooks, ProviderAdapter, ProviderError, ProviderFuture,
    ProviderKind, Turn, classify_engine_fault,
};

/// One load progress report from the engine runtime. Fractions outside
/// `[0, 1]` and regressions are normalized by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLoadReport {
    pub fraction: f32,
    pub note: Option<String>,
}

impl EngineLoadReport {
    pub fn at(fraction: f32) -> Self {
        Self {
            fraction,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

pub type EngineLoadStream<'a> =
    Pin<Box<dyn Stream<Item = Result<EngineLoadReport, EngineFault>> + Send + 'a>>;

pub type EngineTokenStream<'a> =
    Pin<Box<dyn Stream<Item = Result<String, EngineFault>> + Send + 'a>>;

/// One built engine holding a specific model.
pub trait EngineInstance: Send {
    /// Drive the weight download and load. The stream ends when the
    /// model is resident; a fault item aborts the load.
    fn load<'a>(&'a mut self) -> EngineLoadStream<'a>;

    fn generate<'a>(
        &'a mut self,
        transcript: &'a [Turn],
    ) -> ProviderFuture<'a, Result<EngineTokenStream<'a>, EngineFault>>;
}

/// Factory for engine instances. Implementations wrap whatever runtime
/// actually executes the model on the local accelerator.
pub trait EngineRuntime: Send + Sync {
    fn build<'a>(
        &'a self,
        model: &'static ModelCatalogEntry,
        sampling: SamplingOptions,
    ) -> ProviderFuture<'a, Result<Box<dyn EngineInstance>, EngineFault>>;
}

struct LoadedEngine {
    entry: &'static ModelCatalogEntry,
    instance: Box<dyn EngineInstance>,
}

/// Adapter for the in-process engine backend.
pub struct LocalEngineAdapter {
    runtime: Arc<dyn EngineRuntime>,
    slot: Mutex<Option<LoadedEngine>>,
    epoch: AtomicU64,
    hooks: Arc<dyn AdapterHooks>,
}

impl LocalEngineAdapter {
    pub fn new(runtime: Arc<dyn EngineRuntime>) -> Self {
        Self::with_hooks(runtime, Arc::new(NoopAdapterHooks))
    }

    pub fn with_hooks(runtime: Arc<dyn EngineRuntime>, hooks: Arc<dyn AdapterHooks>) -> Self {
        Self {
            runtime,
            slot: Mutex::new(None),
            epoch: AtomicU64::new(0),
            hooks,
        }
    }

    /// Whether an engine instance is currently resident.
    pub fn is_loaded(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn take_loaded(&self, model: &str) -> Result<Option<Box<dyn EngineInstance>>, ProviderError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| ProviderError::other("engine slot lock poisoned"))?;

        match slot.take() {
            Some(loaded) if loaded.entry.id == model => Ok(Some(loaded.instance)),
            Some(loaded) => {
                self.hooks.on_engine_discarded(loaded.entry.id, "model changed");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn store_loaded(
        &self,
        epoch: u64,
        entry: &'static ModelCatalogEntry,
        instance: Box<dyn EngineInstance>,
    ) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };

        // A reset bumped the epoch while this dispatch was in flight;
        // the instance must not survive it.
        if self.epoch.load(Ordering::Acquire) != epoch {
            self.hooks.on_engine_discarded(entry.id, "reset during dispatch");
            return;
        }

        *slot = Some(LoadedEngine { entry, instance });
    }
}

impl ProviderAdapter for LocalEngineAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalEngine
    }

    fn dispatch<'a>(&'a self, request: DispatchRequest) -> BoxedDispatchStream<'a> {
        let stream = try_stream! {
            let config = prepare(&request)?;
            let entry = catalog::require_engine_model(&config.model)?;
            let epoch = self.epoch.load(Ordering::Acquire);

            let mut engine = match self.take_loaded(entry.id)? {
                Some(instance) => instance,
                None => {
                    self.hooks.on_engine_build_started(entry.id);
                    let sampling = entry.recommended.with_temperature(config.temperature);
                    let mut instance = self
                        .runtime
                        .build(entry, sampling)
                        .await
                        .map_err(|fault| classify_engine_fault(&fault.message))?;

                    let mut last_fraction = 0.0_f32;
                    {
                        let mut load = instance.load();
                        while let Some(report) = load.next().await {
                            let report =
                                report.map_err(|fault| classify_engine_fault(&fault.message))?;
                            let fraction = normalize_fraction(report.fraction, last_fraction);
                            last_fraction = fraction;
                            self.hooks.on_engine_load_progress(entry.id, fraction);

                            let mut progress = LoadProgress::at(fraction);
                            if let Some(note) = report.note {
                                progress = progress.with_detail(note);
                            }

                            yield DispatchEvent::Progress(progress);
                        }
                    }

                    // Runtimes are not required to report a final 1.0.
                    if last_fraction < 1.0 {
                        self.hooks.on_engine_load_progress(entry.id, 1.0);
                        yield DispatchEvent::Progress(LoadProgress::at(1.0));
                    }

                    self.hooks.on_engine_ready(entry.id);
                    instance
                }
            };

            let mut content = String::new();
            {
                let mut tokens = match engine.generate(&request.transcript).await {
                    Ok(tokens) => tokens,
                    Err(fault) => {
                        self.hooks.on_engine_discarded(entry.id, &fault.message);
                        Err(classify_engine_fault(&fault.message))?
                    }
                };

                while let Some(item) = tokens.next().await {
                    let token = match item {
                        Ok(token) => token,
                        Err(fault) => {
                            self.hooks.on_engine_discarded(entry.id, &fault.message);
                            Err(classify_engine_fault(&fault.message))?
                        }
                    };

                    if token.is_empty() {
                        continue;
                    }

                    content.push_str(&token);
                    yield DispatchEvent::ContentDelta(token);
                }
            }

            self.store_loaded(epoch, entry, engine);
            yield DispatchEvent::Complete(Turn::assistant(content));
        };

        Box::pin(stream)
    }

    fn reset<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.epoch.fetch_add(1, Ordering::AcqRel);

            if let Ok(mut slot) = self.slot.lock()
                && let Some(loaded) = slot.take()
            {
                self.hooks.on_engine_discarded(loaded.entry.id, "reset");
            }
        })
    }
}

fn prepare(request: &DispatchRequest) -> Result<LocalEngineConfig, ProviderError> {
    request.validate()?;
    request.config.clone().into_local_engine()
}

/// Clamp a reported fraction into `[0, 1]` and keep the sequence
/// monotonic. Non-finite reports repeat the last good value.
fn normalize_fraction(reported: f32, last: f32) -> f32 {
    if !reported.is_finite() {
        return last;
    }

    reported.clamp(0.0, 1.0).max(last)
}

#[cfg(test)]
mod tests {
    use super::normalize_fraction;

    #[test]
    fn fractions_are_clamped_and_monotonic() {
        assert_eq!(normalize_fraction(-0.5, 0.0), 0.0);
        assert_eq!(normalize_fraction(0.4, 0.0), 0.4);
        assert_eq!(normalize_fraction(0.2, 0.4), 0.4);
        assert_eq!(normalize_fraction(7.0, 0.4), 1.0);
    }

    #[test]
    fn non_finite_fractions_repeat_the_last_value() {
        assert_eq!(normalize_fraction(f32::NAN, 0.6), 0.6);
        assert_eq!(normalize_fraction(f32::INFINITY, 0.6), 0.6);
    }
}
