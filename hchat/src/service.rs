//! The chat controller: turn dispatch, provider selection, and
//! connectivity tracking over a set of registered adapters.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_stream::stream;
use futures_util::StreamExt;
use hprovider::{
    AdapterRegistry, DispatchEvent, DispatchRequest, HttpServerConfig, ProviderAdapter,
    ProviderError, ProviderErrorKind, ProviderKind, ServerProbe, Turn, TurnRole, catalog,
};

use crate::error::{ChatError, ChatErrorKind};
use crate::hooks::{ChatLifecycleHooks, NoopChatHooks};
use crate::store::{InMemorySettingsStore, InMemoryTranscriptStore, SettingsStore, TranscriptStore};
use crate::types::{
    ChatEvent, ChatSettings, ChatTurnStream, ConnectivityReport, ConnectivityState, Notice,
    TurnFailure, TurnOutcome, notice_for,
};

/// Where the controller sits in the turn dispatch cycle.
///
/// `Dispatched` covers the span from acceptance until the first piece of
/// assistant content arrives, at which point the phase moves on to
/// `Streaming`. Both count as busy; the distinction exists so surfaces
/// can show "waiting" and "answering" differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Dispatched,
    Streaming,
}

#[derive(Debug)]
struct ChatState {
    transcript: Vec<Turn>,
    settings: ChatSettings,
    connectivity: ConnectivityState,
    phase: RequestPhase,
    /// Bumped by every clear. In-flight work from an older epoch is
    /// abandoned the moment it observes the mismatch.
    epoch: u64,
}

/// Puts the controller back into `Idle` exactly once, either explicitly
/// through [`DispatchGuard::finish`] before the terminal event is
/// yielded, or on drop when the consumer abandons the stream mid-turn.
/// The epoch pins the guard to its own dispatch: once a clear has moved
/// the conversation on, a stale guard leaves the phase alone.
struct DispatchGuard<'a> {
    controller: &'a ChatController,
    epoch: u64,
    armed: bool,
}

impl<'a> DispatchGuard<'a> {
    fn new(controller: &'a ChatController, epoch: u64) -> Self {
        Self {
            controller,
            epoch,
            armed: true,
        }
    }

    fn finish(&mut self) {
        if self.armed {
            self.armed = false;
            let mut state = self.controller.state();
            if state.epoch == self.epoch {
                state.phase = RequestPhase::Idle;
            }
        }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Builder for [`ChatController`].
///
/// Stores default to in-memory implementations and hooks to a no-op, so
/// the minimal useful controller is `builder().register_adapter(..).build()`.
pub struct ChatControllerBuilder {
    adapters: AdapterRegistry,
    probe: Option<Arc<dyn ServerProbe>>,
    transcript_store: Option<Arc<dyn TranscriptStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    hooks: Option<Arc<dyn ChatLifecycleHooks>>,
    settings: ChatSettings,
}

impl Default for ChatControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatControllerBuilder {
    pub fn new() -> Self {
        Self {
            adapters: AdapterRegistry::new(),
            probe: None,
            transcript_store: None,
            settings_store: None,
            hooks: None,
            settings: ChatSettings::default(),
        }
    }

    pub fn register_adapter<A>(mut self, adapter: A) -> Self
    where
        A: ProviderAdapter + 'static,
    {
        self.adapters.register(adapter);
        self
    }

    pub fn register_shared_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.register_shared(adapter);
        self
    }

    /// Probe used by [`ChatController::refresh_connectivity`]. Without
    /// one, connectivity stays `Unknown` and never gates dispatch.
    pub fn with_probe(mut self, probe: Arc<dyn ServerProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_transcript_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.transcript_store = Some(store);
        self
    }

    pub fn with_settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ChatLifecycleHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Initial settings, used until [`ChatController::bootstrap`]
    /// replaces them with whatever the settings store holds.
    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> ChatController {
        ChatController {
            adapters: self.adapters,
            probe: self.probe,
            transcript_store: self
                .transcript_store
                .unwrap_or_else(|| Arc::new(InMemoryTranscriptStore::new())),
            settings_store: self
                .settings_store
                .unwrap_or_else(|| Arc::new(InMemorySettingsStore::new())),
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopChatHooks)),
            state: Mutex::new(ChatState {
                transcript: Vec::new(),
                settings: self.settings,
                connectivity: ConnectivityState::Unknown,
                phase: RequestPhase::Idle,
                epoch: 0,
            }),
        }
    }
}

/// Orchestrates conversations over the registered provider adapters.
///
/// The controller is single-flight: one turn dispatch at a time, with
/// settings changes refused while a dispatch is in flight. Clearing the
/// conversation is the one exception; it interrupts the in-flight turn.
/// All state lives behind one mutex; methods take `&self` and the
/// controller is shared via `Arc` in typical use.
pub struct ChatController {
    adapters: AdapterRegistry,
    probe: Option<Arc<dyn ServerProbe>>,
    transcript_store: Arc<dyn TranscriptStore>,
    settings_store: Arc<dyn SettingsStore>,
    hooks: Arc<dyn ChatLifecycleHooks>,
    state: Mutex<ChatState>,
}

impl ChatController {
    pub fn builder() -> ChatControllerBuilder {
        ChatControllerBuilder::new()
    }

    // State is only ever mutated through short critical sections that
    // cannot panic, so a poisoned lock still holds consistent data.
    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.state().transcript.clone()
    }

    pub fn settings(&self) -> ChatSettings {
        self.state().settings.clone()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.state().connectivity
    }

    pub fn phase(&self) -> RequestPhase {
        self.state().phase
    }

    pub fn is_dispatching(&self) -> bool {
        self.phase() != RequestPhase::Idle
    }

    /// Whether selecting the system model still needs the one-time
    /// user acknowledgement.
    pub fn needs_system_model_setup(&self) -> bool {
        !self.state().settings.system_model_acknowledged
    }

    /// Open the stores, hydrate settings and transcript from them, then
    /// take an initial connectivity reading when the server backend is
    /// active.
    ///
    /// A store that fails to open is reported through
    /// [`ChatLifecycleHooks::on_store_degraded`] and the session runs
    /// in-memory for that concern; the first such error is also
    /// returned so a surface can tell the user the session will not
    /// persist. Load failures after a successful open degrade the same
    /// way but are not returned.
    pub async fn bootstrap(&self) -> Result<(), ChatError> {
        let mut unavailable = None;

        let transcript_ready = match self.transcript_store.initialize().await {
            Ok(()) => true,
            Err(error) => {
                self.hooks.on_store_degraded(&error);
                unavailable.get_or_insert(error);
                false
            }
        };

        let settings_ready = match self.settings_store.initialize().await {
            Ok(()) => true,
            Err(error) => {
                self.hooks.on_store_degraded(&error);
                unavailable.get_or_insert(error);
                false
            }
        };

        if settings_ready {
            match self.settings_store.load().await {
                Ok(Some(settings)) => self.state().settings = settings,
                Ok(None) => {}
                Err(error) => self.hooks.on_store_degraded(&error),
            }
        }

        if transcript_ready {
            match self.transcript_store.load().await {
                Ok(turns) => self.state().transcript = turns,
                Err(error) => self.hooks.on_store_degraded(&error),
            }
        }

        if self.settings().provider == ProviderKind::HttpServer {
            self.refresh_connectivity().await;
        }

        match unavailable {
            Some(error) => Err(ChatError::from(error)),
            None => Ok(()),
        }
    }

    /// Send a user message to the selected backend and stream the reply.
    ///
    /// Gate checks happen eagerly: empty input, a dispatch already in
    /// flight, and a missing adapter all fail here without touching the
    /// transcript. When the server backend is selected and not known to
    /// be connected, one probe runs first, and an unreachable server or
    /// a missing model refuses the dispatch the same way. Once a stream
    /// is returned, every later fault arrives in-band as a
    /// [`ChatEvent::TurnFailed`] terminal event instead of an `Err`.
    ///
    /// On failure the pending user turn is reverted and the original
    /// input text rides back on the failure event, so the exchange
    /// either completes whole or leaves the transcript untouched.
    /// [`ChatController::clear_conversation`] may interrupt the turn at
    /// any point; the stream then simply ends.
    pub async fn dispatch_turn(
        &self,
        input: impl Into<String>,
    ) -> Result<ChatTurnStream<'_>, ChatError> {
        let text = input.into().trim().to_string();
        if text.is_empty() {
            return Err(ChatError::invalid_request("message must not be empty"));
        }

        let (adapter, provider, gate_needed, epoch) = {
            let mut state = self.state();

            if state.phase != RequestPhase::Idle {
                return Err(ChatError::request_in_flight(
                    "a dispatch is already in flight",
                ));
            }

            let provider = state.settings.provider;
            let Some(adapter) = self.adapters.get(provider) else {
                return Err(ChatError::unknown_provider(format!(
                    "no adapter registered for {provider}"
                )));
            };

            let gate_needed = provider == ProviderKind::HttpServer
                && self.probe.is_some()
                && state.connectivity != ConnectivityState::Connected;

            state.phase = RequestPhase::Dispatched;
            (adapter, provider, gate_needed, state.epoch)
        };

        // The phase is claimed; from here the guard releases it on every
        // early return as well as when the stream ends or is dropped.
        let mut guard = DispatchGuard::new(self, epoch);

        if gate_needed {
            let report = self.refresh_connectivity().await;
            if report.state != ConnectivityState::Connected {
                return Err(Self::gate_refusal(&report));
            }
        }

        let (request, user_turn) = {
            let mut state = self.state();

            // A clear may have landed while the probe ran; the dispatch
            // then continues against the fresh conversation.
            guard.epoch = state.epoch;
            state.phase = RequestPhase::Dispatched;

            let user_turn = Turn::user(text.clone());
            state.transcript.push(user_turn.clone());

            let request =
                DispatchRequest::new(state.transcript.clone(), state.settings.active_config());
            (request, user_turn)
        };
        let epoch = guard.epoch;

        let stream = stream! {
            if !self.epoch_changed(epoch) {
                yield ChatEvent::TurnAppended(user_turn);
                self.persist_transcript_if_current(epoch).await;
                self.hooks.on_turn_started(provider);

                let mut completed = None;
                let mut failure = None;
                let mut content = String::new();
                let mut abandoned = false;

                {
                    let mut events = adapter.dispatch(request);
                    while let Some(item) = events.next().await {
                        if self.epoch_changed(epoch) {
                            abandoned = true;
                            break;
                        }

                        match item {
                            Ok(DispatchEvent::Progress(progress)) => {
                                yield ChatEvent::LoadProgress(progress);
                            }
                            Ok(DispatchEvent::ContentDelta(delta)) => {
                                self.mark_streaming(epoch);
                                content.push_str(&delta);
                                yield ChatEvent::ContentDelta {
                                    delta,
                                    content: content.clone(),
                                };
                            }
                            Ok(DispatchEvent::Complete(turn)) => {
                                completed = Some(turn);
                            }
                            Err(error) => {
                                failure = Some(error);
                                break;
                            }
                        }
                    }
                }

                if !abandoned {
                    let event = match (completed, failure) {
                        (Some(turn), None) => self
                            .complete_turn(provider, turn, epoch)
                            .await
                            .map(ChatEvent::TurnCompleted),
                        (_, Some(error)) => self
                            .fail_turn(provider, error, text, epoch)
                            .await
                            .map(ChatEvent::TurnFailed),
                        (None, None) => {
                            let error =
                                ProviderError::other("the dispatch stream ended without completing");
                            self.fail_turn(provider, error, text, epoch)
                                .await
                                .map(ChatEvent::TurnFailed)
                        }
                    };

                    // Release the gate before the terminal event so a
                    // consumer may dispatch the next turn as soon as it
                    // sees it.
                    if let Some(event) = event {
                        guard.finish();
                        yield event;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// Drop every turn, in memory and in the store, and reset every
    /// registered adapter so backend conversation state does not leak
    /// into the next exchange.
    ///
    /// Clearing is never refused. Invoked mid-dispatch it abandons the
    /// in-flight turn: the turn's stream ends without a terminal event
    /// and the controller is idle again by the time this returns. The
    /// in-memory transcript is cleared even when the store fails; the
    /// store error is returned so the caller can surface it.
    pub async fn clear_conversation(&self) -> Result<(), ChatError> {
        {
            let mut state = self.state();
            state.transcript.clear();
            state.phase = RequestPhase::Idle;
            state.epoch += 1;
        }

        let store_result = self.transcript_store.clear().await;

        for adapter in self.adapters.adapters() {
            adapter.reset().await;
        }

        self.hooks.on_transcript_cleared();
        store_result.map_err(ChatError::from)
    }

    /// Switch the active backend.
    ///
    /// Switching away resets the previous adapter, releasing whatever
    /// it kept resident. Selecting the system model requires a prior
    /// [`ChatController::acknowledge_system_model_setup`].
    pub async fn select_provider(&self, provider: ProviderKind) -> Result<ChatSettings, ChatError> {
        let (previous, settings) = {
            let mut state = self.state();

            if state.phase != RequestPhase::Idle {
                return Err(ChatError::request_in_flight(
                    "cannot switch providers while a dispatch is in flight",
                ));
            }

            if state.settings.provider == provider {
                return Ok(state.settings.clone());
            }

            if provider == ProviderKind::SystemModel && !state.settings.system_model_acknowledged {
                return Err(ChatError::acknowledgement_required(
                    "the system model is experimental and must be acknowledged before use",
                ));
            }

            if !self.adapters.contains(provider) {
                return Err(ChatError::unknown_provider(format!(
                    "no adapter registered for {provider}"
                )));
            }

            let previous = state.settings.provider;
            state.settings.provider = provider;
            (previous, state.settings.clone())
        };

        if let Some(adapter) = self.adapters.get(previous) {
            adapter.reset().await;
        }

        // The old connectivity reading described the old selection.
        if previous == ProviderKind::HttpServer || provider == ProviderKind::HttpServer {
            self.update_connectivity(ConnectivityState::Unknown);
        }

        self.persist_settings().await;
        self.hooks.on_selection_changed(&settings);

        if provider == ProviderKind::HttpServer {
            self.refresh_connectivity().await;
        }

        Ok(settings)
    }

    /// Choose which catalog model the in-process engine runs. The
    /// resident engine is not touched here; the rebuild happens lazily
    /// on the next engine dispatch.
    pub async fn select_engine_model(&self, model_id: &str) -> Result<ChatSettings, ChatError> {
        let entry = catalog::require_engine_model(model_id)?;

        let settings = {
            let mut state = self.state();

            if state.phase != RequestPhase::Idle {
                return Err(ChatError::request_in_flight(
                    "cannot change models while a dispatch is in flight",
                ));
            }

            state.settings.engine.model = entry.id.to_string();
            state.settings.clone()
        };

        self.persist_settings().await;
        self.hooks.on_selection_changed(&settings);

        Ok(settings)
    }

    /// Replace the server backend configuration. The old connectivity
    /// reading described the old endpoint, so it is invalidated and,
    /// when the server backend is active, refreshed right away.
    pub async fn configure_server(&self, config: HttpServerConfig) -> Result<ChatSettings, ChatError> {
        if config.endpoint.trim().is_empty() {
            return Err(ChatError::invalid_request("server endpoint must not be empty"));
        }

        if config.model.trim().is_empty() {
            return Err(ChatError::invalid_request("server model must not be empty"));
        }

        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(ChatError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        let settings = {
            let mut state = self.state();

            if state.phase != RequestPhase::Idle {
                return Err(ChatError::request_in_flight(
                    "cannot reconfigure the server while a dispatch is in flight",
                ));
            }

            state.settings.server = config;
            state.connectivity = ConnectivityState::Unknown;
            state.settings.clone()
        };

        self.persist_settings().await;
        self.hooks.on_selection_changed(&settings);

        if settings.provider == ProviderKind::HttpServer {
            self.refresh_connectivity().await;
        }

        Ok(settings)
    }

    /// Adjust the sampling temperature for the in-process engine. Takes
    /// effect on the next dispatch; an in-flight turn is unaffected.
    pub async fn set_engine_temperature(&self, temperature: f32) -> Result<ChatSettings, ChatError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ChatError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        let settings = {
            let mut state = self.state();
            state.settings.engine.temperature = temperature;
            state.settings.clone()
        };

        self.persist_settings().await;
        Ok(settings)
    }

    /// Record that the user accepted the experimental system model.
    pub async fn acknowledge_system_model_setup(&self) -> ChatSettings {
        let settings = {
            let mut state = self.state();
            state.settings.system_model_acknowledged = true;
            state.settings.clone()
        };

        self.persist_settings().await;
        settings
    }

    /// Probe the configured server endpoint and update the dispatch
    /// gate. Without a configured probe the state stays `Unknown`.
    ///
    /// A reachable server that does not have the configured model
    /// installed counts as `Error`: it could not serve a dispatch any
    /// better than an unreachable one.
    pub async fn refresh_connectivity(&self) -> ConnectivityReport {
        let Some(probe) = self.probe.clone() else {
            return ConnectivityReport {
                state: ConnectivityState::Unknown,
                version: None,
                model_present: None,
                notice: None,
            };
        };

        let server = self.settings().server;

        let report = match probe.probe(&server.endpoint, &server.model).await {
            Ok(outcome) if outcome.model_present => ConnectivityReport {
                state: ConnectivityState::Connected,
                version: Some(outcome.version),
                model_present: Some(true),
                notice: None,
            },
            Ok(outcome) => ConnectivityReport {
                state: ConnectivityState::Error,
                version: Some(outcome.version),
                model_present: Some(false),
                notice: Some(
                    Notice::warning(format!(
                        "Model {} is not installed on the server.",
                        server.model
                    ))
                    .with_title("Model not installed"),
                ),
            },
            Err(error) => ConnectivityReport {
                state: ConnectivityState::Error,
                version: None,
                model_present: None,
                notice: Some(
                    Notice::error(format!(
                        "The model server could not be reached: {}",
                        error.message
                    ))
                    .with_title("Connection failed"),
                ),
            },
        };

        self.update_connectivity(report.state);
        if let Some(notice) = &report.notice {
            self.hooks.on_notice(notice);
        }

        report
    }

    fn gate_refusal(report: &ConnectivityReport) -> ChatError {
        match report.model_present {
            Some(false) => ChatError::new(
                ChatErrorKind::Provider(ProviderErrorKind::ModelNotFound),
                "the configured model is not installed on the server",
            ),
            _ => ChatError::new(
                ChatErrorKind::Provider(ProviderErrorKind::EndpointUnreachable),
                "the model server is unreachable; check the connection and retry",
            ),
        }
    }

    fn epoch_changed(&self, epoch: u64) -> bool {
        self.state().epoch != epoch
    }

    fn mark_streaming(&self, epoch: u64) {
        let mut state = self.state();
        if state.epoch == epoch && state.phase == RequestPhase::Dispatched {
            state.phase = RequestPhase::Streaming;
        }
    }

    async fn complete_turn(
        &self,
        provider: ProviderKind,
        turn: Turn,
        epoch: u64,
    ) -> Option<TurnOutcome> {
        {
            let mut state = self.state();
            if state.epoch != epoch {
                return None;
            }
            state.transcript.push(turn.clone());
        }

        self.persist_transcript_if_current(epoch).await;

        // A reply from the server doubles as proof of reachability.
        if provider == ProviderKind::HttpServer {
            self.update_connectivity(ConnectivityState::Connected);
        }

        let outcome = TurnOutcome { provider, turn };
        self.hooks.on_turn_completed(&outcome);
        Some(outcome)
    }

    async fn fail_turn(
        &self,
        provider: ProviderKind,
        error: ProviderError,
        input: String,
        epoch: u64,
    ) -> Option<TurnFailure> {
        {
            let mut state = self.state();
            if state.epoch != epoch {
                return None;
            }
            if state.transcript.last().map(|turn| turn.role) == Some(TurnRole::User) {
                state.transcript.pop();
            }
        }

        self.persist_transcript_if_current(epoch).await;

        let notice = notice_for(&error);
        self.hooks.on_turn_failed(provider, &error);
        self.hooks.on_notice(&notice);

        // A failed server dispatch usually means reachability changed;
        // re-probe right away so the gate reflects it.
        if provider == ProviderKind::HttpServer {
            self.refresh_connectivity().await;
        }

        Some(TurnFailure {
            provider,
            error,
            restored_input: input,
            notice,
        })
    }

    /// Save the transcript unless a clear has moved the conversation on
    /// since the snapshot would have been taken.
    async fn persist_transcript_if_current(&self, epoch: u64) {
        let snapshot = {
            let state = self.state();
            if state.epoch != epoch {
                return;
            }
            state.transcript.clone()
        };

        if let Err(error) = self.transcript_store.save(&snapshot).await {
            self.hooks.on_store_degraded(&error);
        }
    }

    async fn persist_settings(&self) {
        let snapshot = self.settings();
        if let Err(error) = self.settings_store.save(&snapshot).await {
            self.hooks.on_store_degraded(&error);
        }
    }

    fn update_connectivity(&self, next: ConnectivityState) {
        let changed = {
            let mut state = self.state();
            let changed = state.connectivity != next;
            state.connectivity = next;
            changed
        };

        if changed {
            self.hooks.on_connectivity_changed(next);
        }
    }
}
