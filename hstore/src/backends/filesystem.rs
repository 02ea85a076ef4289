use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hchat::ChatSettings;
use hcommon::BoxFuture;
use hprovider::{HttpServerConfig, LocalEngineConfig, ProviderKind, Turn, TurnRole};
use serde::{Deserialize, Serialize};

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Backend that keeps the conversation in a single JSON file under the
/// given root directory. Writes go through a temporary file and a
/// rename, so a crash mid-write leaves the previous state intact.
#[derive(Debug)]
pub struct FilesystemStorageBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemStorageBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|error| {
            StorageError::storage(format!("failed to create filesystem backend root: {error}"))
        })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn state_path(&self) -> PathBuf {
        self.root.join("chat.json")
    }

    fn load_state(&self) -> Result<Option<PersistedState>, StorageError> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|error| {
            StorageError::storage(format!("failed to read chat state file: {error}"))
        })?;
        let state = serde_json::from_slice::<PersistedState>(&bytes).map_err(|error| {
            StorageError::serialization(format!("failed to deserialize chat state: {error}"))
        })?;
        Ok(Some(state))
    }

    fn save_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(state).map_err(|error| {
            StorageError::serialization(format!("failed to serialize chat state: {error}"))
        })?;

        write_atomic(&self.state_path(), &bytes)
    }
}

impl StorageBackend for FilesystemStorageBackend {
    fn initialize<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            fs::create_dir_all(&self.root).map_err(|error| {
                StorageError::storage(format!(
                    "failed to create filesystem backend root: {error}"
                ))
            })
        })
    }

    fn load_transcript<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Turn>, StorageError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StorageError::storage("filesystem backend lock poisoned"))?;
            let Some(state) = self.load_state()? else {
                return Ok(Vec::new());
            };
            state
                .transcript
                .into_iter()
                .map(PersistedTurn::into_turn)
                .collect()
        })
    }

    fn replace_transcript<'a>(
        &'a self,
        transcript: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StorageError::storage("filesystem backend lock poisoned"))?;
            let mut state = self.load_state()?.unwrap_or_default();
            state.transcript = transcript.into_iter().map(PersistedTurn::from_turn).collect();
            self.save_state(&state)
        })
    }

    fn clear_transcript<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StorageError::storage("filesystem backend lock poisoned"))?;
            let mut state = self.load_state()?.unwrap_or_default();
            state.transcript.clear();
            self.save_state(&state)
        })
    }

    fn load_settings<'a>(&'a self) -> BoxFuture<'a, Result<Option<ChatSettings>, StorageError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StorageError::storage("filesystem backend lock poisoned"))?;
            let Some(state) = self.load_state()? else {
                return Ok(None);
            };
            state
                .settings
                .map(PersistedSettings::into_settings)
                .transpose()
        })
    }

    fn save_settings<'a>(
        &'a self,
        settings: ChatSettings,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| StorageError::storage("filesystem backend lock poisoned"))?;
            let mut state = self.load_state()?.unwrap_or_default();
            state.settings = Some(PersistedSettings::from_settings(settings));
            self.save_state(&state)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    settings: Option<PersistedSettings>,
    transcript: Vec<PersistedTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSettings {
    provider: String,
    server: PersistedServerConfig,
    engine: PersistedEngineConfig,
    system_model_acknowledged: bool,
}

impl PersistedSettings {
    fn from_settings(settings: ChatSettings) -> Self {
        Self {
            provider: provider_to_str(settings.provider).to_string(),
            server: PersistedServerConfig {
                endpoint: settings.server.endpoint,
                model: settings.server.model,
                temperature: settings.server.temperature,
            },
            engine: PersistedEngineConfig {
                model: settings.engine.model,
                temperature: settings.engine.temperature,
            },
            system_model_acknowledged: settings.system_model_acknowledged,
        }
    }

    fn into_settings(self) -> Result<ChatSettings, StorageError> {
        Ok(ChatSettings {
            provider: provider_from_str(&self.provider)?,
            server: HttpServerConfig {
                endpoint: self.server.endpoint,
                model: self.server.model,
                temperature: self.server.temperature,
            },
            engine: LocalEngineConfig {
                model: self.engine.model,
                temperature: self.engine.temperature,
            },
            system_model_acknowledged: self.system_model_acknowledged,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedServerConfig {
    endpoint: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEngineConfig {
    model: String,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedTurn {
    role: String,
    content: String,
}

impl PersistedTurn {
    fn from_turn(turn: Turn) -> Self {
        Self {
            role: role_to_str(turn.role).to_string(),
            content: turn.content,
        }
    }

    fn into_turn(self) -> Result<Turn, StorageError> {
        Ok(Turn::new(role_from_str(&self.role)?, self.content))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let Some(parent) = path.parent() else {
        return Err(StorageError::storage(
            "chat state file missing parent directory",
        ));
    };
    fs::create_dir_all(parent).map_err(|error| {
        StorageError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        StorageError::storage(format!("failed to write temporary state file: {error}"))
    })?;

    if path.exists() {
        fs::remove_file(path).map_err(|error| {
            StorageError::storage(format!("failed to replace existing state file: {error}"))
        })?;
    }
    fs::rename(&tmp, path)
        .map_err(|error| StorageError::storage(format!("failed to finalize state file: {error}")))
}

fn provider_to_str(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::HttpServer => "http-server",
        ProviderKind::LocalEngine => "local-engine",
        ProviderKind::SystemModel => "system-model",
    }
}

fn provider_from_str(value: &str) -> Result<ProviderKind, StorageError> {
    match value {
        "http-server" => Ok(ProviderKind::HttpServer),
        "local-engine" => Ok(ProviderKind::LocalEngine),
        "system-model" => Ok(ProviderKind::SystemModel),
        _ => Err(StorageError::serialization(format!(
            "unknown provider value '{value}'"
        ))),
    }
}

fn role_to_str(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Assistant => "assistant",
    }
}

fn role_from_str(value: &str) -> Result<TurnRole, StorageError> {
    match value {
        "user" => Ok(TurnRole::User),
        "assistant" => Ok(TurnRole::Assistant),
        _ => Err(StorageError::serialization(format!(
            "unknown transcript role value '{value}'"
        ))),
    }
}
