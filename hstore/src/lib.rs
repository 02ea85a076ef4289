//! Transcript and settings persistence layer with hchat store adapter support.

mod adapter;
mod backend;
mod backends;
mod error;

pub mod prelude {
    pub use crate::{
        FilesystemStorageBackend, InMemoryStorageBackend, SqliteStorageBackend, StorageBackend,
        StorageBackendConfig, StorageChatStore, StorageError, StorageErrorKind,
        create_default_storage_backend, create_storage_backend,
    };
}

pub use adapter::StorageChatStore;
pub use backend::{
    FilesystemStorageBackend, InMemoryStorageBackend, SqliteStorageBackend, StorageBackend,
    StorageBackendConfig, create_default_storage_backend, create_storage_backend,
};
pub use error::{StorageError, StorageErrorKind};
