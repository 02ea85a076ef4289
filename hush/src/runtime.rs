//! Runtime wiring helpers for embedding the chat stack.

use std::sync::Arc;

use crate::adapters::ServerAdapterConfig;
use crate::{
    ChatController, ChatControllerBuilder, ChatError, ChatLifecycleHooks, InMemoryStorageBackend,
    ProviderAdapter, SafeChatHooks, StorageBackendConfig, StorageChatStore, StoreError,
    TracingObservabilityHooks, create_storage_backend,
};

/// Everything an embedding application needs to run chat: the shared
/// store and the controller wired over it.
///
/// Construction opens the backing medium but loads nothing from it;
/// call [`ChatController::bootstrap`] once at startup to restore
/// persisted state and take the first connectivity reading.
#[derive(Clone)]
pub struct ChatRuntime {
    pub store: Arc<StorageChatStore>,
    pub controller: Arc<ChatController>,
}

pub fn in_memory_store() -> Arc<StorageChatStore> {
    Arc::new(StorageChatStore::new(Arc::new(InMemoryStorageBackend::new())))
}

pub fn default_store() -> Result<Arc<StorageChatStore>, ChatError> {
    persistent_store(StorageBackendConfig::default())
}

/// Opens the configured backend and wraps it for the chat layer.
pub fn persistent_store(config: StorageBackendConfig) -> Result<Arc<StorageChatStore>, ChatError> {
    let backend = create_storage_backend(config)
        .map_err(|error| StoreError::unavailable(error.to_string()))?;

    Ok(Arc::new(StorageChatStore::new(backend)))
}

/// Chat lifecycle hooks that log through `tracing` and swallow observer
/// panics.
pub fn tracing_chat_hooks() -> Arc<dyn ChatLifecycleHooks> {
    Arc::new(SafeChatHooks::new(TracingObservabilityHooks))
}

/// Builds the default runtime: durable storage at the stock location
/// with the HTTP server adapter registered and probing.
pub fn build_runtime() -> Result<ChatRuntime, ChatError> {
    build_runtime_with(default_store()?, Vec::new(), ServerAdapterConfig::new())
}

pub fn build_runtime_with_store(store: Arc<StorageChatStore>) -> Result<ChatRuntime, ChatError> {
    build_runtime_with(store, Vec::new(), ServerAdapterConfig::new())
}

/// Full wiring: the HTTP server adapter plus any extra adapters, all
/// persisting through `store` and reporting through tracing hooks.
pub fn build_runtime_with(
    store: Arc<StorageChatStore>,
    extra_adapters: Vec<Arc<dyn ProviderAdapter>>,
    server: ServerAdapterConfig,
) -> Result<ChatRuntime, ChatError> {
    let mut builder = ChatController::builder()
        .with_transcript_store(Arc::clone(&store) as _)
        .with_settings_store(Arc::clone(&store) as _)
        .with_hooks(tracing_chat_hooks());

    builder = register_server_adapter(builder, &server)?;

    for adapter in extra_adapters {
        builder = builder.register_shared_adapter(adapter);
    }

    let controller = Arc::new(builder.build());

    Ok(ChatRuntime { store, controller })
}

#[cfg(feature = "adapter-http")]
fn register_server_adapter(
    builder: ChatControllerBuilder,
    config: &ServerAdapterConfig,
) -> Result<ChatControllerBuilder, ChatError> {
    let adapter = crate::adapters::build_server_adapter_with_config(config.clone())?;
    let probe = Arc::new(adapter.clone());

    Ok(builder.register_adapter(adapter).with_probe(probe))
}

#[cfg(not(feature = "adapter-http"))]
fn register_server_adapter(
    _builder: ChatControllerBuilder,
    _config: &ServerAdapterConfig,
) -> Result<ChatControllerBuilder, ChatError> {
    Err(crate::ProviderError::invalid_request(
        "adapter-http feature is not enabled on hush",
    )
    .into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::StreamExt;

    use crate::adapters::ServerAdapterConfig;
    use crate::{
        BoxedDispatchStream, ChatEvent, DispatchEvent, DispatchRequest, ProviderAdapter,
        ProviderFuture, ProviderKind, TranscriptStore, Turn, TurnRole, VecDispatchStream,
    };

    use super::{build_runtime_with, build_runtime_with_store, in_memory_store};

    #[derive(Debug)]
    struct FakeEngineAdapter;

    impl ProviderAdapter for FakeEngineAdapter {
        fn kind(&self) -> ProviderKind {
            ProviderKind::LocalEngine
        }

        fn dispatch<'a>(&'a self, request: DispatchRequest) -> BoxedDispatchStream<'a> {
            let events = match request.validate() {
                Ok(()) => vec![
                    Ok(DispatchEvent::ContentDelta("done".to_string())),
                    Ok(DispatchEvent::Complete(Turn::assistant("done"))),
                ],
                Err(error) => vec![Err(error)],
            };

            Box::pin(VecDispatchStream::new(events))
        }

        fn reset<'a>(&'a self) -> ProviderFuture<'a, ()> {
            Box::pin(async {})
        }
    }

    #[tokio::test]
    async fn build_runtime_wires_dispatch_to_the_store() {
        let store = in_memory_store();
        let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![Arc::new(FakeEngineAdapter)];
        let runtime = build_runtime_with(Arc::clone(&store), adapters, ServerAdapterConfig::new())
            .expect("runtime should build");

        runtime
            .controller
            .select_provider(ProviderKind::LocalEngine)
            .await
            .expect("the engine adapter is registered");

        let mut stream = runtime
            .controller
            .dispatch_turn("hello")
            .await
            .expect("dispatch should start");

        let mut last = None;
        while let Some(event) = stream.next().await {
            last = Some(event);
        }

        match last {
            Some(ChatEvent::TurnCompleted(outcome)) => {
                assert_eq!(outcome.turn.content, "done");
            }
            other => panic!("expected a completed turn, got {other:?}"),
        }

        let transcript = store.load().await.expect("transcript should load");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, TurnRole::User);
        assert_eq!(transcript[1].role, TurnRole::Assistant);
    }

    #[test]
    fn build_runtime_with_store_shares_one_controller() {
        let runtime = build_runtime_with_store(in_memory_store()).expect("runtime should build");

        assert_eq!(runtime.controller.settings().provider, ProviderKind::HttpServer);

        let clone = runtime.clone();
        assert!(Arc::ptr_eq(&runtime.controller, &clone.controller));
    }
}
