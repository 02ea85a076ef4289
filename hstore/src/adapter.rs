//! Adapter that exposes a storage backend as hchat stores.

use std::sync::Arc;

use hchat::{ChatFuture, ChatSettings, SettingsStore, StoreError, TranscriptStore};
use hprovider::Turn;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Bridges one [`StorageBackend`] to both of hchat's persistence
/// traits, so a single database file holds the transcript and the
/// settings. Clone it and hand the clones to the controller builder.
#[derive(Clone)]
pub struct StorageChatStore {
    backend: Arc<dyn StorageBackend>,
}

impl StorageChatStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.backend)
    }
}

impl TranscriptStore for StorageChatStore {
    fn initialize<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.backend.initialize().await.map_err(unavailable_error) })
    }

    fn load<'a>(&'a self) -> ChatFuture<'a, Result<Vec<Turn>, StoreError>> {
        Box::pin(async move { self.backend.load_transcript().await.map_err(read_error) })
    }

    fn save<'a>(&'a self, transcript: &'a [Turn]) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.backend
                .replace_transcript(transcript.to_vec())
                .await
                .map_err(write_error)
        })
    }

    fn clear<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.backend.clear_transcript().await.map_err(write_error) })
    }
}

impl SettingsStore for StorageChatStore {
    fn initialize<'a>(&'a self) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.backend.initialize().await.map_err(unavailable_error) })
    }

    fn load<'a>(&'a self) -> ChatFuture<'a, Result<Option<ChatSettings>, StoreError>> {
        Box::pin(async move { self.backend.load_settings().await.map_err(read_error) })
    }

    fn save<'a>(&'a self, settings: &'a ChatSettings) -> ChatFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.backend
                .save_settings(settings.clone())
                .await
                .map_err(write_error)
        })
    }
}

// The storage layer classifies faults by cause; the chat layer wants
// them classified by the operation that hit them. The cause survives in
// the message text.
fn unavailable_error(error: StorageError) -> StoreError {
    StoreError::unavailable(error.message)
}

fn read_error(error: StorageError) -> StoreError {
    StoreError::read(error.message)
}

fn write_error(error: StorageError) -> StoreError {
    StoreError::write(error.message)
}
