//! Storage backend trait and in-memory backend implementation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use hchat::ChatSettings;
use hcommon::BoxFuture;
use hprovider::Turn;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::StorageError;

pub use crate::backends::filesystem::FilesystemStorageBackend;
pub use crate::backends::sqlite::SqliteStorageBackend;

/// Durable storage for one conversation and its chat settings.
///
/// `replace_transcript` always receives the full transcript; backends
/// rewrite wholesale rather than diffing, which keeps the stored copy
/// consistent with the in-memory one after reverts.
pub trait StorageBackend: Send + Sync {
    /// Opens or re-creates the backing medium. Constructors already do
    /// this once; overriding lets a backend re-validate a medium that
    /// can vanish between sessions. The default is a no-op.
    fn initialize<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Ok(()) })
    }

    fn load_transcript<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Turn>, StorageError>>;

    fn replace_transcript<'a>(
        &'a self,
        transcript: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    fn clear_transcript<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Returns `None` when no settings have been persisted yet.
    fn load_settings<'a>(&'a self) -> BoxFuture<'a, Result<Option<ChatSettings>, StorageError>>;

    fn save_settings<'a>(
        &'a self,
        settings: ChatSettings,
    ) -> BoxFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendConfig {
    Sqlite { path: PathBuf },
    Filesystem { root: PathBuf },
    InMemory,
}

impl Default for StorageBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_storage_backend(
    config: StorageBackendConfig,
) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config {
        StorageBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteStorageBackend::new(path)?)),
        StorageBackendConfig::Filesystem { root } => {
            Ok(Arc::new(FilesystemStorageBackend::new(root)?))
        }
        StorageBackendConfig::InMemory => Ok(Arc::new(InMemoryStorageBackend::new())),
    }
}

pub fn create_default_storage_backend() -> Result<Arc<dyn StorageBackend>, StorageError> {
    create_storage_backend(StorageBackendConfig::default())
}

/// Backend that keeps everything in process memory. Useful in tests and
/// for sessions that should not leave any trace on disk.
#[derive(Debug, Default)]
pub struct InMemoryStorageBackend {
    state: Mutex<StoredState>,
}

#[derive(Debug, Default, Clone)]
struct StoredState {
    settings: Option<ChatSettings>,
    transcript: Vec<Turn>,
}

impl InMemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryStorageBackend {
    fn load_transcript<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Turn>, StorageError>> {
        Box::pin(async move {
            let state = self
                .state
                .lock()
                .map_err(|_| StorageError::storage("in-memory backend lock poisoned"))?;
            Ok(state.transcript.clone())
        })
    }

    fn replace_transcript<'a>(
        &'a self,
        transcript: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self
                .state
                .lock()
                .map_err(|_| StorageError::storage("in-memory backend lock poisoned"))?;
            state.transcript = transcript;
            Ok(())
        })
    }

    fn clear_transcript<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self
                .state
                .lock()
                .map_err(|_| StorageError::storage("in-memory backend lock poisoned"))?;
            state.transcript.clear();
            Ok(())
        })
    }

    fn load_settings<'a>(&'a self) -> BoxFuture<'a, Result<Option<ChatSettings>, StorageError>> {
        Box::pin(async move {
            let state = self
                .state
                .lock()
                .map_err(|_| StorageError::storage("in-memory backend lock poisoned"))?;
            Ok(state.settings.clone())
        })
    }

    fn save_settings<'a>(
        &'a self,
        settings: ChatSettings,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self
                .state
                .lock()
                .map_err(|_| StorageError::storage("in-memory backend lock poisoned"))?;
            state.settings = Some(settings);
            Ok(())
        })
    }
}
