//! Common imports for most Hush applications.

pub use crate::{
    assistant_turn, build_runtime, build_runtime_with, build_runtime_with_store, default_store,
    engine_config, in_memory_store, parse_provider_kind, persistent_store, server_config,
    tracing_adapter_hooks, tracing_chat_hooks, user_turn,
};
pub use crate::ServerAdapterConfig;
#[cfg(feature = "adapter-engine")]
pub use crate::build_engine_adapter;
#[cfg(feature = "adapter-http")]
pub use crate::{build_server_adapter, build_server_adapter_with_config};
#[cfg(feature = "adapter-native")]
pub use crate::build_system_model_adapter;
pub use crate::{hush_settings, hush_transcript, hush_turn};
pub use crate::{
    AdapterRegistry, BoxFuture, ChatController, ChatControllerBuilder, ChatError, ChatErrorKind,
    ChatEvent, ChatLifecycleHooks, ChatRuntime, ChatSettings, ChatTurnStream, ConnectivityReport,
    ConnectivityState, DispatchEvent, DispatchRequest, HttpServerConfig, InMemorySettingsStore,
    InMemoryTranscriptStore, LoadProgress, LocalEngineConfig, NoopChatHooks, Notice, NoticeLevel,
    ProviderAdapter, ProviderConfig, ProviderError, ProviderErrorKind, ProviderKind, RequestPhase,
    SamplingOptions, ServerProbe, SettingsStore, StorageBackend, StorageBackendConfig,
    StorageChatStore, StoreError, StoreErrorKind, TranscriptStore, Turn, TurnFailure, TurnOutcome,
    TurnRole,
};
