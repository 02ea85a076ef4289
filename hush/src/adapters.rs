//! Stable adapter construction surface for facade consumers.

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "adapter-http")]
use reqwest::Client;

#[cfg(any(feature = "adapter-engine", feature = "adapter-native"))]
use crate::ProviderAdapter;
#[cfg(feature = "adapter-http")]
use crate::ProviderError;
use crate::{AdapterHooks, SafeAdapterHooks, TracingObservabilityHooks};
#[cfg(feature = "adapter-engine")]
use hprovider::adapters::engine::{EngineRuntime, LocalEngineAdapter};
#[cfg(feature = "adapter-http")]
use hprovider::adapters::http::HttpServerAdapter;
#[cfg(feature = "adapter-native")]
use hprovider::adapters::native::{SystemModelAdapter, SystemTextModel};

/// Client settings for the HTTP server adapter.
#[derive(Debug, Clone)]
pub struct ServerAdapterConfig {
    pub timeout: Duration,
}

impl ServerAdapterConfig {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(90),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ServerAdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the HTTP server adapter with the default client settings.
#[cfg(feature = "adapter-http")]
pub fn build_server_adapter() -> Result<HttpServerAdapter, ProviderError> {
    build_server_adapter_with_config(ServerAdapterConfig::new())
}

/// Builds the HTTP server adapter over a client honoring `config`.
///
/// The returned adapter doubles as the connectivity probe: register it on
/// the controller and hand a clone to
/// [`ChatControllerBuilder::with_probe`](crate::ChatControllerBuilder::with_probe).
#[cfg(feature = "adapter-http")]
pub fn build_server_adapter_with_config(
    config: ServerAdapterConfig,
) -> Result<HttpServerAdapter, ProviderError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|error| ProviderError::other(format!("failed to build HTTP client: {error}")))?;

    Ok(HttpServerAdapter::with_client(client))
}

/// Wraps an engine runtime in its adapter, with load progress reported
/// through tracing.
#[cfg(feature = "adapter-engine")]
pub fn build_engine_adapter(runtime: Arc<dyn EngineRuntime>) -> Arc<dyn ProviderAdapter> {
    Arc::new(LocalEngineAdapter::with_hooks(
        runtime,
        tracing_adapter_hooks(),
    ))
}

/// Wraps a platform text model in its adapter, with lifecycle faults
/// reported through tracing.
#[cfg(feature = "adapter-native")]
pub fn build_system_model_adapter(model: Arc<dyn SystemTextModel>) -> Arc<dyn ProviderAdapter> {
    Arc::new(SystemModelAdapter::with_hooks(
        model,
        tracing_adapter_hooks(),
    ))
}

/// Adapter hooks that log through `tracing` and swallow observer panics.
pub fn tracing_adapter_hooks() -> Arc<dyn AdapterHooks> {
    Arc::new(SafeAdapterHooks::new(TracingObservabilityHooks))
}
