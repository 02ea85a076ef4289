//! Persistence contracts for transcripts and settings.
//!
//! The controller treats persistence as best-effort: a failing store
//! degrades the session to in-memory operation instead of blocking the
//! conversation. Stores are async traits so backends can sit on files,
//! embedded databases, or anything else.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use hprovider::Turn;

use crate::types::ChatSettings;

/// Boxed future type used throughout the chat layer.
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// The backend could not be opened or initialized at all.
    Unavailable,
    /// Persisted data could not be read or decoded.
    Read,
    /// New data could not be written or cleared.
    Write,
    /// Anything the backend cannot classify (poisoned lock, closed handle).
    Other,
}

/// An error surfaced by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Read, message)
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Write, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

/// Durable storage for the conversation transcript.
///
/// `initialize` runs once during bootstrap, before any load. `save`
/// always receives the full transcript snapshot; backends are free to
/// diff or rewrite wholesale.
pub trait TranscriptStore: Send + Sync {
    /// Opens or creates the backing medium. The default is a no-op for
    /// backends that need no setup.
    fn initialize<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn load<'a>(&'a self) -> ChatFuture<'a, Result<Vec<Turn>, StoreError>>;

    fn save<'a>(&'a self, transcript: &'a [Turn]) -> ChatFuture<'a, Result<(), StoreError>>;

    fn clear<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>>;
}

/// Durable storage for chat settings.
pub trait SettingsStore: Send + Sync {
    /// Opens or creates the backing medium. The default is a no-op.
    fn initialize<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    /// Returns `None` when nothing has been persisted yet.
    fn load<'a>(&'a self) -> ChatFuture<'a, Result<Option<ChatSettings>, StoreError>>;

    fn save<'a>(&'a self, settings: &'a ChatSettings) -> ChatFuture<'a, Result<(), StoreError>>;
}

/// Transcript store backed by process memory. The default when no
/// durable backend is configured, and the workhorse of the test suites.
#[derive(Debug, Default)]
pub struct InMemoryTranscriptStore {
    turns: Mutex<Vec<Turn>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranscriptStore for InMemoryTranscriptStore {
    fn load<'a>(&'a self) -> ChatFuture<'a, Result<Vec<Turn>, StoreError>> {
        Box::pin(async move {
            let turns = self
                .turns
                .lock()
                .map_err(|_| StoreError::other("transcript store lock poisoned"))?;
            Ok(turns.clone())
        })
    }

    fn save<'a>(&'a self, transcript: &'a [Turn]) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut turns = self
                .turns
                .lock()
                .map_err(|_| StoreError::other("transcript store lock poisoned"))?;
            *turns = transcript.to_vec();
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut turns = self
                .turns
                .lock()
                .map_err(|_| StoreError::other("transcript store lock poisoned"))?;
            turns.clear();
            Ok(())
        })
    }
}

/// Settings store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    settings: Mutex<Option<ChatSettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load<'a>(&'a self) -> ChatFuture<'a, Result<Option<ChatSettings>, StoreError>> {
        Box::pin(async move {
            let settings = self
                .settings
                .lock()
                .map_err(|_| StoreError::other("settings store lock poisoned"))?;
            Ok(settings.clone())
        })
    }

    fn save<'a>(&'a self, settings: &'a ChatSettings) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut slot = self
                .settings
                .lock()
                .map_err(|_| StoreError::other("settings store lock poisoned"))?;
            *slot = Some(settings.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transcript_store_round_trips_and_clears() {
        let store = InMemoryTranscriptStore::new();
        let transcript = vec![Turn::user("hello"), Turn::assistant("hi")];

        store
            .initialize()
            .await
            .expect("in-memory initialize is a no-op");
        store
            .save(&transcript)
            .await
            .expect("saving should succeed");
        assert_eq!(
            store.load().await.expect("loading should succeed"),
            transcript
        );

        store.clear().await.expect("clearing should succeed");
        assert!(
            store
                .load()
                .await
                .expect("loading should succeed")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn settings_store_starts_empty() {
        let store = InMemorySettingsStore::new();
        assert_eq!(store.load().await.expect("loading should succeed"), None);

        let settings = ChatSettings::default();
        store.save(&settings).await.expect("saving should succeed");
        assert_eq!(
            store.load().await.expect("loading should succeed"),
            Some(settings)
        );
    }
}
