//! Unified facade over the Hush workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the core hush crates and provides convenience utilities
//! and macros for common setup and wiring flows.

mod macros;

pub mod adapters;
pub mod prelude;
pub mod runtime;
pub mod util;

pub use hchat;
pub use hcommon;
pub use hobserve;
pub use hprovider;
pub use hstore;

pub use hchat::{
    ChatController, ChatControllerBuilder, ChatError, ChatErrorKind, ChatEvent, ChatFuture,
    ChatLifecycleHooks, ChatSettings, ChatTurnStream, ConnectivityReport, ConnectivityState,
    InMemorySettingsStore, InMemoryTranscriptStore, NoopChatHooks, Notice, NoticeLevel,
    RequestPhase, SettingsStore, StoreError, StoreErrorKind, TranscriptStore, TurnFailure,
    TurnOutcome, notice_for, notice_level,
};
pub use hcommon::{BoxFuture, Registry, SamplingOptions};
pub use hobserve::{
    MetricsObservabilityHooks, SafeAdapterHooks, SafeChatHooks, TracingObservabilityHooks,
};
pub use hprovider::{
    AdapterHooks, AdapterRegistry, BoxedDispatchStream, DEFAULT_SERVER_ENDPOINT,
    DEFAULT_SERVER_MODEL, DispatchEvent, DispatchRequest, DispatchStream, EngineFault,
    HttpServerConfig, LoadProgress, LoadStage, LocalEngineConfig, NoopAdapterHooks, ProbeReport,
    ProviderAdapter, ProviderConfig, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderKind, ServerProbe, SystemModelConfig, Turn, TurnRole, VecDispatchStream,
    classify_engine_fault, classify_system_fault,
};
pub use hstore::{
    FilesystemStorageBackend, InMemoryStorageBackend, SqliteStorageBackend, StorageBackend,
    StorageBackendConfig, StorageChatStore, StorageError, StorageErrorKind,
    create_default_storage_backend, create_storage_backend,
};

pub use adapters::{ServerAdapterConfig, tracing_adapter_hooks};
#[cfg(feature = "adapter-engine")]
pub use adapters::build_engine_adapter;
#[cfg(feature = "adapter-http")]
pub use adapters::{build_server_adapter, build_server_adapter_with_config};
#[cfg(feature = "adapter-native")]
pub use adapters::build_system_model_adapter;
pub use runtime::{
    ChatRuntime, build_runtime, build_runtime_with, build_runtime_with_store, default_store,
    in_memory_store, persistent_store, tracing_chat_hooks,
};
pub use util::{assistant_turn, engine_config, parse_provider_kind, server_config, user_turn};
