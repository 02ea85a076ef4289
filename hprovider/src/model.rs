//! Provider kinds, transcript turns, and per-provider dispatch configuration.
//!
//! ```rust
//! use hprovider::{DispatchRequest, ProviderConfig, ProviderErrorKind, Turn};
//!
//! let ok = DispatchRequest::new_validated(
//!     vec![Turn::user("What is a borrow checker?")],
//!     ProviderConfig::default_http_server(),
//! );
//! assert!(ok.is_ok());
//!
//! let err = DispatchRequest::new_validated(vec![], ProviderConfig::default_http_server())
//!     .err()
//!     .expect("empty transcript should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use crate::catalog::DEFAULT_ENGINE_MODEL;
use crate::{ProviderError, ProviderErrorKind};

/// Default base URL of the local HTTP model server.
pub const DEFAULT_SERVER_ENDPOINT: &str = "http://localhost:11435";

/// Default model requested from the HTTP model server.
pub const DEFAULT_SERVER_MODEL: &str = "qwen2.5:14b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    HttpServer,
    LocalEngine,
    SystemModel,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::HttpServer,
        ProviderKind::LocalEngine,
        ProviderKind::SystemModel,
    ];
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::HttpServer => "http-server",
            Self::LocalEngine => "local-engine",
            Self::SystemModel => "system-model",
        };

        f.write_str(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the conversation. Ordering is the only relationship
/// between turns; a transcript is an ordered `Vec<Turn>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpServerConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SERVER_ENDPOINT.to_string(),
            model: DEFAULT_SERVER_MODEL.to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalEngineConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for LocalEngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_ENGINE_MODEL.to_string(),
            temperature: 0.7,
        }
    }
}

/// The system model takes no configuration; the platform decides which
/// model answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemModelConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    HttpServer(HttpServerConfig),
    LocalEngine(LocalEngineConfig),
    SystemModel(SystemModelConfig),
}

impl ProviderConfig {
    pub fn default_http_server() -> Self {
        Self::HttpServer(HttpServerConfig::default())
    }

    pub fn default_local_engine() -> Self {
        Self::LocalEngine(LocalEngineConfig::default())
    }

    pub fn default_system_model() -> Self {
        Self::SystemModel(SystemModelConfig)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::HttpServer(_) => ProviderKind::HttpServer,
            Self::LocalEngine(_) => ProviderKind::LocalEngine,
            Self::SystemModel(_) => ProviderKind::SystemModel,
        }
    }

    pub fn into_http_server(self) -> Result<HttpServerConfig, ProviderError> {
        match self {
            Self::HttpServer(config) => Ok(config),
            other => Err(kind_mismatch(ProviderKind::HttpServer, other.kind())),
        }
    }

    pub fn into_local_engine(self) -> Result<LocalEngineConfig, ProviderError> {
        match self {
            Self::LocalEngine(config) => Ok(config),
            other => Err(kind_mismatch(ProviderKind::LocalEngine, other.kind())),
        }
    }

    pub fn into_system_model(self) -> Result<SystemModelConfig, ProviderError> {
        match self {
            Self::SystemModel(config) => Ok(config),
            other => Err(kind_mismatch(ProviderKind::SystemModel, other.kind())),
        }
    }
}

fn kind_mismatch(expected: ProviderKind, actual: ProviderKind) -> ProviderError {
    ProviderError::invalid_request(format!(
        "configuration for {actual} was handed to the {expected} adapter"
    ))
}

/// Everything an adapter needs for one dispatch: the full ordered
/// transcript plus the active provider's configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub transcript: Vec<Turn>,
    pub config: ProviderConfig,
}

impl DispatchRequest {
    pub fn new(transcript: Vec<Turn>, config: ProviderConfig) -> Self {
        Self { transcript, config }
    }

    pub fn new_validated(
        transcript: Vec<Turn>,
        config: ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let request = Self::new(transcript, config);
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.transcript.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one turn is required",
            ));
        }

        if let Some(last) = self.transcript.last()
            && last.role != TurnRole::User
        {
            return Err(ProviderError::invalid_request(
                "the transcript must end with a user turn",
            ));
        }

        match &self.config {
            ProviderConfig::HttpServer(config) => {
                if config.endpoint.trim().is_empty() {
                    return Err(ProviderError::invalid_request(
                        "server endpoint must not be empty",
                    ));
                }

                if config.model.trim().is_empty() {
                    return Err(ProviderError::invalid_request("model must not be empty"));
                }

                validate_temperature(config.temperature)?;
            }
            ProviderConfig::LocalEngine(config) => {
                if config.model.trim().is_empty() {
                    return Err(ProviderError::invalid_request("model must not be empty"));
                }

                validate_temperature(config.temperature)?;
            }
            ProviderConfig::SystemModel(_) => {}
        }

        Ok(())
    }
}

fn validate_temperature(temperature: f32) -> Result<(), ProviderError> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ProviderError::new(
            ProviderErrorKind::InvalidRequest,
            "temperature must be in the inclusive range 0.0..=2.0",
            false,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        DispatchRequest, HttpServerConfig, LocalEngineConfig, ProviderConfig, ProviderKind, Turn,
    };
    use crate::ProviderErrorKind;

    #[test]
    fn provider_kinds_render_stable_identifiers() {
        assert_eq!(ProviderKind::HttpServer.to_string(), "http-server");
        assert_eq!(ProviderKind::LocalEngine.to_string(), "local-engine");
        assert_eq!(ProviderKind::SystemModel.to_string(), "system-model");
    }

    #[test]
    fn default_configs_carry_the_stock_settings() {
        let server = HttpServerConfig::default();
        assert_eq!(server.endpoint, "http://localhost:11435");
        assert_eq!(server.model, "qwen2.5:14b");
        assert_eq!(server.temperature, 0.3);

        let engine = LocalEngineConfig::default();
        assert_eq!(engine.model, "Qwen2.5-0.5B-Instruct-q4f16_1-MLC");
        assert_eq!(engine.temperature, 0.7);
    }

    #[test]
    fn validation_rejects_transcripts_not_ending_with_a_user_turn() {
        let request = DispatchRequest::new(
            vec![Turn::user("hi"), Turn::assistant("hello")],
            ProviderConfig::default_http_server(),
        );

        let error = request.validate().err().expect("should fail");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
    }

    #[test]
    fn validation_rejects_out_of_range_temperature() {
        let request = DispatchRequest::new(
            vec![Turn::user("hi")],
            ProviderConfig::LocalEngine(LocalEngineConfig {
                model: "Qwen2.5-0.5B-Instruct-q4f16_1-MLC".to_string(),
                temperature: 3.5,
            }),
        );

        let error = request.validate().err().expect("should fail");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
    }

    #[test]
    fn config_extraction_rejects_kind_mismatches() {
        let config = ProviderConfig::default_system_model();
        let error = config.into_http_server().err().expect("should fail");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
        assert!(error.message.contains("system-model"));
    }
}
