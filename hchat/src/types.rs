//! Settings, notices, connectivity, and the turn event stream.

use std::pin::Pin;

use futures_core::Stream;
use hprovider::{
    HttpServerConfig, LoadProgress, LocalEngineConfig, ProviderConfig, ProviderError,
    ProviderErrorKind, ProviderKind, SystemModelConfig, Turn,
};

/// The user's backend selection and per-backend configuration.
///
/// Settings survive restarts through a [`SettingsStore`](crate::SettingsStore);
/// each backend keeps its own configuration so switching back and forth
/// does not lose tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub provider: ProviderKind,
    pub server: HttpServerConfig,
    pub engine: LocalEngineConfig,
    /// The system model is experimental. It stays unselectable until the
    /// user has confirmed that once; the flag persists with the rest.
    pub system_model_acknowledged: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::HttpServer,
            server: HttpServerConfig::default(),
            engine: LocalEngineConfig::default(),
            system_model_acknowledged: false,
        }
    }
}

impl ChatSettings {
    /// Dispatch configuration for the currently selected backend.
    pub fn active_config(&self) -> ProviderConfig {
        match self.provider {
            ProviderKind::HttpServer => ProviderConfig::HttpServer(self.server.clone()),
            ProviderKind::LocalEngine => ProviderConfig::LocalEngine(self.engine.clone()),
            ProviderKind::SystemModel => ProviderConfig::SystemModel(SystemModelConfig),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A short, user-facing status message: a headline plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(
        level: NoticeLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, "Notice", message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, "Notice", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, "Error", message)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Build the user-facing notice for a failed dispatch.
///
/// The wording stays generic on purpose; the raw backend message rides
/// along in the [`ProviderError`] itself for anyone who wants detail.
pub fn notice_for(error: &ProviderError) -> Notice {
    let (title, message) = match error.kind {
        ProviderErrorKind::EndpointUnreachable => (
            "Connection interrupted",
            "The model server connection was interrupted.",
        ),
        ProviderErrorKind::ModelNotFound => {
            ("Model not installed", "The requested model is not available.")
        }
        ProviderErrorKind::EngineUnavailable => (
            "Engine unavailable",
            "The inference engine is not available on this device.",
        ),
        ProviderErrorKind::DownloadFailure => {
            ("Download interrupted", "The model download was interrupted.")
        }
        ProviderErrorKind::OutOfMemory => (
            "Out of memory",
            "The device ran out of memory while running the model.",
        ),
        ProviderErrorKind::DeviceLost => (
            "Device lost",
            "The accelerator was lost while running the model.",
        ),
        ProviderErrorKind::EmptyResponse => ("Empty reply", "The model returned no content."),
        ProviderErrorKind::UnsupportedLanguageOutput => (
            "Language not supported",
            "The model declined to answer in this language.",
        ),
        ProviderErrorKind::InvalidRequest => {
            ("Request rejected", "The request was rejected before dispatch.")
        }
        ProviderErrorKind::Other => (
            "Error",
            "The model backend reported an unexpected failure.",
        ),
    };

    Notice::new(notice_level(error.kind), title, message)
}

/// Severity for a dispatch failure. Faults that block the exchange
/// outright surface as errors; faults the user can route around by
/// switching models or rephrasing come through as warnings.
pub fn notice_level(kind: ProviderErrorKind) -> NoticeLevel {
    match kind {
        ProviderErrorKind::ModelNotFound
        | ProviderErrorKind::EngineUnavailable
        | ProviderErrorKind::EmptyResponse
        | ProviderErrorKind::UnsupportedLanguageOutput => NoticeLevel::Warning,
        _ => NoticeLevel::Error,
    }
}

/// Last known reachability of the model server backend.
///
/// `Connected` means the endpoint answered *and* the configured model is
/// installed; a reachable server missing the model is still `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Unknown,
    Connected,
    Error,
}

/// Outcome of probing the model server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityReport {
    pub state: ConnectivityState,
    pub version: Option<String>,
    pub model_present: Option<bool>,
    pub notice: Option<Notice>,
}

/// A successfully completed assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub provider: ProviderKind,
    pub turn: Turn,
}

/// A failed dispatch, reported after the pending user turn was reverted.
///
/// `restored_input` carries the original message text so a surface can
/// hand it back to the composer for editing and retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnFailure {
    pub provider: ProviderKind,
    pub error: ProviderError,
    pub restored_input: String,
    pub notice: Notice,
}

/// Events emitted over a [`ChatTurnStream`].
///
/// Exactly one of `TurnCompleted` or `TurnFailed` terminates the stream.
/// By the time the terminal event is yielded the controller is idle
/// again, so a consumer may immediately dispatch the next turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The user turn was accepted and appended to the transcript.
    TurnAppended(Turn),
    /// The backend is still getting ready; no content yet.
    LoadProgress(LoadProgress),
    /// A chunk of assistant output, with the accumulated reply so far.
    ///
    /// Surfaces that re-render the whole bubble per frame read `content`;
    /// incremental renderers append `delta`.
    ContentDelta { delta: String, content: String },
    TurnCompleted(TurnOutcome),
    TurnFailed(TurnFailure),
}

pub type ChatTurnStream<'a> = Pin<Box<dyn Stream<Item = ChatEvent> + Send + 'a>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_select_the_server_backend() {
        let settings = ChatSettings::default();

        assert_eq!(settings.provider, ProviderKind::HttpServer);
        assert!(!settings.system_model_acknowledged);
        assert!(matches!(
            settings.active_config(),
            ProviderConfig::HttpServer(_)
        ));
    }

    #[test]
    fn active_config_follows_the_selection() {
        let settings = ChatSettings {
            provider: ProviderKind::LocalEngine,
            engine: LocalEngineConfig {
                model: "model-x".to_string(),
                ..LocalEngineConfig::default()
            },
            ..ChatSettings::default()
        };

        match settings.active_config() {
            ProviderConfig::LocalEngine(config) => assert_eq!(config.model, "model-x"),
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn blocking_faults_surface_as_errors() {
        for error in [
            ProviderError::endpoint_unreachable("connection refused"),
            ProviderError::download_failure("fetch aborted"),
            ProviderError::out_of_memory("buffer allocation failed"),
            ProviderError::device_lost("adapter destroyed"),
        ] {
            let notice = notice_for(&error);
            assert_eq!(notice.level, NoticeLevel::Error, "kind {:?}", error.kind);
        }
    }

    #[test]
    fn recoverable_faults_surface_as_warnings() {
        for error in [
            ProviderError::model_not_found("model-x is not installed"),
            ProviderError::engine_unavailable("no accelerator on this device"),
            ProviderError::empty_response("blank reply"),
            ProviderError::unsupported_language_output("untested language"),
        ] {
            let notice = notice_for(&error);
            assert_eq!(notice.level, NoticeLevel::Warning, "kind {:?}", error.kind);
        }
    }

    #[test]
    fn every_fault_notice_carries_a_title() {
        let notice = notice_for(&ProviderError::endpoint_unreachable("connection refused"));
        assert_eq!(notice.title, "Connection interrupted");

        let notice = notice_for(&ProviderError::unsupported_language_output("untested language"));
        assert_eq!(notice.title, "Language not supported");

        let plain = Notice::warning("model-x is not installed on the server");
        assert_eq!(plain.title, "Notice");
        assert_eq!(
            plain.clone().with_title("Model not installed").title,
            "Model not installed"
        );
    }
}
