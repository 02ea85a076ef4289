//! Small convenience constructors for common types.

use crate::{HttpServerConfig, LocalEngineConfig, ProviderKind, Turn};

pub fn user_turn(content: impl Into<String>) -> Turn {
    Turn::user(content)
}

pub fn assistant_turn(content: impl Into<String>) -> Turn {
    Turn::assistant(content)
}

pub fn server_config(endpoint: impl Into<String>, model: impl Into<String>) -> HttpServerConfig {
    HttpServerConfig {
        endpoint: endpoint.into(),
        model: model.into(),
        ..HttpServerConfig::default()
    }
}

pub fn engine_config(model: impl Into<String>, temperature: f32) -> LocalEngineConfig {
    LocalEngineConfig {
        model: model.into(),
        temperature,
    }
}

pub fn parse_provider_kind(value: &str) -> Option<ProviderKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "http-server" | "http_server" | "server" | "http" | "ollama" => {
            Some(ProviderKind::HttpServer)
        }
        "local-engine" | "local_engine" | "engine" | "local" => Some(ProviderKind::LocalEngine),
        "system-model" | "system_model" | "system" | "native" => Some(ProviderKind::SystemModel),
        _ => None,
    }
}
