//! Adapter for a locally hosted HTTP model server.
//!
//! The server speaks a line-delimited JSON chat protocol: one POST to
//! `/api/chat` with `stream: true`, answered by NDJSON chunks until a
//! chunk carrying `done: true`. Reachability checks use `/api/version`
//! and the `/api/tags` model listing.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    BoxedDispatchStream, DispatchEvent, DispatchRequest, HttpServerConfig, ProbeReport,
    ProviderAdapter, ProviderError, ProviderErrorKind, ProviderFuture, ProviderKind, ServerProbe,
    Turn, TurnRole,
};

/// JSON body posted to `/api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ServerChatRequest {
    pub model: String,
    pub messages: Vec<ServerChatMessage>,
    pub stream: bool,
    pub options: ServerChatOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServerChatOptions {
    pub temperature: f32,
}

/// One NDJSON line of a streamed chat response. Every field is optional
/// on the wire; a line may carry content, a terminator, a server-side
/// error, or any mix of the three.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerChatChunk {
    #[serde(default)]
    pub message: Option<ServerChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerChunkMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ServerVersionResponse {
    version: String,
}

#[derive(Debug, Deserialize)]
struct ServerTagsResponse {
    #[serde(default)]
    models: Vec<ServerModelTag>,
}

#[derive(Debug, Deserialize)]
struct ServerModelTag {
    name: String,
}

pub type ServerChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ServerChatChunk, ProviderError>> + Send + 'a>>;

/// Wire transport for the model server, split from the adapter so tests
/// can drive the dispatch loop without a live server.
pub trait ServerTransport: Send + Sync + std::fmt::Debug {
    fn stream_chat<'a>(
        &'a self,
        endpoint: String,
        request: ServerChatRequest,
    ) -> ProviderFuture<'a, Result<ServerChunkStream<'a>, ProviderError>>;

    fn fetch_version<'a>(
        &'a self,
        endpoint: String,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;

    fn list_model_tags<'a>(
        &'a self,
        endpoint: String,
    ) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct ReqwestServerTransport {
    client: Client,
}

impl ReqwestServerTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestServerTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ServerTransport for ReqwestServerTransport {
    fn stream_chat<'a>(
        &'a self,
        endpoint: String,
        request: ServerChatRequest,
    ) -> ProviderFuture<'a, Result<ServerChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let url = endpoint_url(&endpoint, "/api/chat");
            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(send_error)?;

            if !response.status().is_success() {
                return Err(parse_error(response).await);
            }

            let stream = try_stream! {
                let mut chunks = response.bytes_stream();
                let mut line_buffer: Vec<u8> = Vec::new();
                let mut finished = false;

                while let Some(item) = chunks.next().await {
                    let bytes = item
                        .map_err(|err| ProviderError::endpoint_unreachable(err.to_string()))?;
                    line_buffer.extend_from_slice(&bytes);

                    // Bytes arrive in arbitrary pieces; only complete
                    // lines are valid UTF-8 JSON documents.
                    while let Some(newline_index) =
                        line_buffer.iter().position(|byte| *byte == b'\n')
                    {
                        let raw_line: Vec<u8> = line_buffer.drain(..=newline_index).collect();
                        let line = std::str::from_utf8(&raw_line)
                            .map_err(|err| ProviderError::other(err.to_string()))?
                            .trim();

                        if line.is_empty() {
                            continue;
                        }

                        let chunk: ServerChatChunk = serde_json::from_str(line).map_err(|err| {
                            ProviderError::other(format!("malformed chat chunk: {err}"))
                        })?;

                        if chunk.done {
                            finished = true;
                        }

                        yield chunk;

                        if finished {
                            break;
                        }
                    }

                    if finished {
                        break;
                    }
                }
            };

            Ok(Box::pin(stream) as ServerChunkStream<'a>)
        })
    }

    fn fetch_version<'a>(
        &'a self,
        endpoint: String,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let url = endpoint_url(&endpoint, "/api/version");
            let response = self.client.get(url).send().await.map_err(send_error)?;

            if !response.status().is_success() {
                return Err(parse_error(response).await);
            }

            let parsed: ServerVersionResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::other(err.to_string()))?;

            Ok(parsed.version)
        })
    }

    fn list_model_tags<'a>(
        &'a self,
        endpoint: String,
    ) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            let url = endpoint_url(&endpoint, "/api/tags");
            let response = self.client.get(url).send().await.map_err(send_error)?;

            if !response.status().is_success() {
                return Err(parse_error(response).await);
            }

            let parsed: ServerTagsResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::other(err.to_string()))?;

            Ok(parsed.models.into_iter().map(|tag| tag.name).collect())
        })
    }
}

/// Adapter for the HTTP model server backend.
///
/// The server owns the model, so the adapter itself is stateless and
/// [`ProviderAdapter::reset`] has nothing to discard.
#[derive(Debug, Clone)]
pub struct HttpServerAdapter {
    transport: Arc<dyn ServerTransport>,
}

impl HttpServerAdapter {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestServerTransport::default()))
    }

    pub fn with_client(client: Client) -> Self {
        Self::with_transport(Arc::new(ReqwestServerTransport::new(client)))
    }

    pub fn with_transport(transport: Arc<dyn ServerTransport>) -> Self {
        Self { transport }
    }
}

impl Default for HttpServerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for HttpServerAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HttpServer
    }

    fn dispatch<'a>(&'a self, request: DispatchRequest) -> BoxedDispatchStream<'a> {
        let stream = try_stream! {
            let config = prepare(&request)?;
            let wire_request = build_chat_request(&request.transcript, &config);
            let mut chunks = self
                .transport
                .stream_chat(config.endpoint.clone(), wire_request)
                .await?;

            let mut content = String::new();

            while let Some(item) = chunks.next().await {
                let chunk = item?;
                require_chunk_ok(&chunk)?;

                if let Some(message) = chunk.message
                    && !message.content.is_empty()
                {
                    content.push_str(&message.content);
                    yield DispatchEvent::ContentDelta(message.content);
                }

                if chunk.done {
                    break;
                }
            }

            yield DispatchEvent::Complete(Turn::assistant(content));
        };

        Box::pin(stream)
    }

    fn reset<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async {})
    }
}

impl ServerProbe for HttpServerAdapter {
    fn probe<'a>(
        &'a self,
        endpoint: &'a str,
        model: &'a str,
    ) -> ProviderFuture<'a, Result<ProbeReport, ProviderError>> {
        Box::pin(async move {
            let version = self.transport.fetch_version(endpoint.to_string()).await?;
            let tags = self.transport.list_model_tags(endpoint.to_string()).await?;
            let model_present = tags.iter().any(|tag| tag == model);

            Ok(ProbeReport {
                version,
                model_present,
            })
        })
    }
}

fn prepare(request: &DispatchRequest) -> Result<HttpServerConfig, ProviderError> {
    request.validate()?;
    request.config.clone().into_http_server()
}

fn build_chat_request(transcript: &[Turn], config: &HttpServerConfig) -> ServerChatRequest {
    ServerChatRequest {
        model: config.model.clone(),
        messages: transcript.iter().map(to_wire_message).collect(),
        stream: true,
        options: ServerChatOptions {
            temperature: config.temperature,
        },
    }
}

fn to_wire_message(turn: &Turn) -> ServerChatMessage {
    let role = match turn.role {
        TurnRole::User => "user",
        TurnRole::Assistant => "assistant",
    };

    ServerChatMessage {
        role: role.to_string(),
        content: turn.content.clone(),
    }
}

fn require_chunk_ok(chunk: &ServerChatChunk) -> Result<(), ProviderError> {
    if let Some(reason) = &chunk.error {
        return Err(chunk_error(reason));
    }

    Ok(())
}

fn chunk_error(reason: &str) -> ProviderError {
    let lowered = reason.to_lowercase();

    if lowered.contains("not found") || lowered.contains("no such model") {
        ProviderError::model_not_found(reason)
    } else {
        ProviderError::new(ProviderErrorKind::Other, reason, true)
    }
}

fn endpoint_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

fn send_error(err: reqwest::Error) -> ProviderError {
    if err.is_connect() || err.is_timeout() {
        ProviderError::endpoint_unreachable(err.to_string())
    } else {
        ProviderError::other(err.to_string())
    }
}

async fn parse_error(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("server request failed with status {status}"));

    match status {
        StatusCode::NOT_FOUND => ProviderError::model_not_found(message),
        StatusCode::BAD_REQUEST => ProviderError::invalid_request(message),
        _ => ProviderError::new(ProviderErrorKind::Other, message, true),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("error")?.as_str()?;

    if message.is_empty() {
        None
    } else {
        Some(truncate(message, 512))
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }

    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls_join_without_duplicate_slashes() {
        assert_eq!(
            endpoint_url("http://localhost:11435", "/api/chat"),
            "http://localhost:11435/api/chat"
        );
        assert_eq!(
            endpoint_url("http://localhost:11435/", "/api/tags"),
            "http://localhost:11435/api/tags"
        );
    }

    #[test]
    fn chat_requests_carry_roles_and_streaming_flag() {
        let transcript = vec![Turn::user("hi"), Turn::assistant("hello"), Turn::user("bye?")];
        let request = build_chat_request(&transcript, &HttpServerConfig::default());

        assert_eq!(request.model, "qwen2.5:14b");
        assert!(request.stream);
        assert_eq!(request.options.temperature, 0.3);
        let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
    }

    #[test]
    fn chunk_errors_map_missing_models() {
        assert_eq!(
            chunk_error("model 'qwen2.5:14b' not found").kind,
            ProviderErrorKind::ModelNotFound
        );
        assert_eq!(
            chunk_error("no such model loaded").kind,
            ProviderErrorKind::ModelNotFound
        );

        let generic = chunk_error("scheduler queue is full");
        assert_eq!(generic.kind, ProviderErrorKind::Other);
        assert!(generic.retryable);
    }

    #[test]
    fn error_bodies_are_unwrapped_and_truncated() {
        assert_eq!(
            extract_error_message(r#"{"error":"model missing"}"#).as_deref(),
            Some("model missing")
        );
        assert_eq!(extract_error_message(r#"{"error":""}"#), None);
        assert_eq!(extract_error_message("plain text"), None);

        let long = format!(r#"{{"error":"{}"}}"#, "x".repeat(600));
        let message = extract_error_message(&long).expect("message");
        assert_eq!(message.len(), 512 + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let text = "号".repeat(200);
        let truncated = truncate(&text, 100);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 103);
    }
}
