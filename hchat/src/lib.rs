//! Conversation orchestration over local inference backends.
//!
//! `hchat` sits between a user surface and the provider adapters in
//! `hprovider`. The [`ChatController`] owns the transcript and the
//! user's backend selection, gates dispatch to one turn at a time,
//! streams replies as [`ChatEvent`]s, and keeps both transcript and
//! settings persisted through pluggable stores.
//!
//! ```rust
//! use hchat::{ChatController, ConnectivityState};
//! use hprovider::ProviderKind;
//!
//! let controller = ChatController::builder().build();
//!
//! assert_eq!(controller.settings().provider, ProviderKind::HttpServer);
//! assert_eq!(controller.connectivity(), ConnectivityState::Unknown);
//! assert!(controller.transcript().is_empty());
//! ```

mod error;
mod hooks;
mod service;
mod store;
mod types;

/// Convenience re-exports for consumers of the chat layer.
pub mod prelude {
    pub use crate::{
        ChatController, ChatControllerBuilder, ChatError, ChatErrorKind, ChatEvent,
        ChatLifecycleHooks, ChatSettings, ChatTurnStream, ConnectivityReport, ConnectivityState,
        InMemorySettingsStore, InMemoryTranscriptStore, NoopChatHooks, Notice, NoticeLevel,
        RequestPhase, SettingsStore, StoreError, StoreErrorKind, TranscriptStore, TurnFailure,
        TurnOutcome,
    };
    pub use hprovider::{
        AdapterRegistry, DispatchEvent, DispatchRequest, ProviderAdapter, ProviderConfig,
        ProviderError, ProviderErrorKind, ProviderKind, Turn, TurnRole,
    };
}

pub use error::{ChatError, ChatErrorKind};
pub use hooks::{ChatLifecycleHooks, NoopChatHooks};
pub use service::{ChatController, ChatControllerBuilder, RequestPhase};
pub use store::{
    ChatFuture, InMemorySettingsStore, InMemoryTranscriptStore, SettingsStore, StoreError,
    StoreErrorKind, TranscriptStore,
};
pub use types::{
    ChatEvent, ChatSettings, ChatTurnStream, ConnectivityReport, ConnectivityState, Notice,
    NoticeLevel, TurnFailure, TurnOutcome, notice_for, notice_level,
};
