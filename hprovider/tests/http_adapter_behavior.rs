#![cfg(feature = "adapter-http")]

use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use hprovider::adapters::http::{
    HttpServerAdapter, ServerChatChunk, ServerChatRequest, ServerChunkMessage, ServerChunkStream,
    ServerTransport,
};
use hprovider::{
    BoxedDispatchStream, DispatchEvent, DispatchRequest, ProviderAdapter, ProviderConfig,
    ProviderError, ProviderErrorKind, ProviderFuture, ServerProbe, Turn,
};

#[derive(Debug, Default)]
struct FakeServerTransport {
    chunks: Mutex<Vec<Result<ServerChatChunk, ProviderError>>>,
    version: Mutex<Option<Result<String, ProviderError>>>,
    tags: Mutex<Option<Result<Vec<String>, ProviderError>>>,
    captured_endpoint: Mutex<Option<String>>,
    captured_request: Mutex<Option<ServerChatRequest>>,
}

impl ServerTransport for FakeServerTransport {
    fn stream_chat<'a>(
        &'a self,
        endpoint: String,
        request: ServerChatRequest,
    ) -> ProviderFuture<'a, Result<ServerChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            *self.captured_endpoint.lock().expect("endpoint lock") = Some(endpoint);
            *self.captured_request.lock().expect("request lock") = Some(request);

            let chunks = std::mem::take(&mut *self.chunks.lock().expect("chunks lock"));
            Ok(Box::pin(futures_util::stream::iter(chunks)) as ServerChunkStream<'a>)
        })
    }

    fn fetch_version<'a>(
        &'a self,
        endpoint: String,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            *self.captured_endpoint.lock().expect("endpoint lock") = Some(endpoint);
            self.version
                .lock()
                .expect("version lock")
                .take()
                .unwrap_or_else(|| Ok("0.0.0".to_string()))
        })
    }

    fn list_model_tags<'a>(
        &'a self,
        _endpoint: String,
    ) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            self.tags
                .lock()
                .expect("tags lock")
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        })
    }
}

fn content_chunk(text: &str) -> ServerChatChunk {
    ServerChatChunk {
        message: Some(ServerChunkMessage {
            content: text.to_string(),
        }),
        done: false,
        error: None,
    }
}

fn done_chunk() -> ServerChatChunk {
    ServerChatChunk {
        message: None,
        done: true,
        error: None,
    }
}

fn user_request(text: &str) -> DispatchRequest {
    DispatchRequest::new(vec![Turn::user(text)], ProviderConfig::default_http_server())
}

async fn collect(
    mut stream: BoxedDispatchStream<'_>,
) -> (Vec<DispatchEvent>, Option<ProviderError>) {
    let mut events = Vec::new();
    let mut error = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => events.push(event),
            Err(err) => {
                error = Some(err);
                break;
            }
        }
    }

    (events, error)
}

#[tokio::test]
async fn streams_deltas_and_completes_with_the_full_response() {
    let transport = Arc::new(FakeServerTransport::default());
    *transport.chunks.lock().expect("chunks lock") = vec![
        Ok(content_chunk("你好")),
        Ok(content_chunk("，世界")),
        Ok(done_chunk()),
    ];

    let adapter = HttpServerAdapter::with_transport(transport.clone());
    let (events, error) = collect(adapter.dispatch(user_request("打个招呼"))).await;

    assert!(error.is_none(), "unexpected error: {error:?}");
    assert_eq!(
        events,
        vec![
            DispatchEvent::ContentDelta("你好".to_string()),
            DispatchEvent::ContentDelta("，世界".to_string()),
            DispatchEvent::Complete(Turn::assistant("你好，世界")),
        ]
    );

    let endpoint = transport
        .captured_endpoint
        .lock()
        .expect("endpoint lock")
        .clone()
        .expect("endpoint should be captured");
    assert_eq!(endpoint, "http://localhost:11435");

    let request = transport
        .captured_request
        .lock()
        .expect("request lock")
        .clone()
        .expect("request should be captured");
    assert_eq!(request.model, "qwen2.5:14b");
    assert!(request.stream);
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, "user");
    assert_eq!(request.options.temperature, 0.3);
}

#[tokio::test]
async fn empty_deltas_are_skipped() {
    let transport = Arc::new(FakeServerTransport::default());
    *transport.chunks.lock().expect("chunks lock") =
        vec![Ok(content_chunk("")), Ok(done_chunk())];

    let adapter = HttpServerAdapter::with_transport(transport);
    let (events, error) = collect(adapter.dispatch(user_request("hi"))).await;

    assert!(error.is_none());
    assert_eq!(events, vec![DispatchEvent::Complete(Turn::assistant(""))]);
}

#[tokio::test]
async fn server_reported_errors_terminate_the_stream() {
    let transport = Arc::new(FakeServerTransport::default());
    *transport.chunks.lock().expect("chunks lock") = vec![
        Ok(content_chunk("partial")),
        Ok(ServerChatChunk {
            message: None,
            done: false,
            error: Some("model 'qwen2.5:14b' not found".to_string()),
        }),
    ];

    let adapter = HttpServerAdapter::with_transport(transport);
    let (events, error) = collect(adapter.dispatch(user_request("hi"))).await;

    assert_eq!(events, vec![DispatchEvent::ContentDelta("partial".to_string())]);
    let error = error.expect("stream should fail");
    assert_eq!(error.kind, ProviderErrorKind::ModelNotFound);
    assert!(!events.iter().any(|event| matches!(event, DispatchEvent::Complete(_))));
}

#[tokio::test]
async fn invalid_requests_fail_before_reaching_the_server() {
    let transport = Arc::new(FakeServerTransport::default());
    let adapter = HttpServerAdapter::with_transport(transport.clone());

    let request = DispatchRequest::new(
        vec![Turn::user("hi"), Turn::assistant("hello")],
        ProviderConfig::default_http_server(),
    );
    let (events, error) = collect(adapter.dispatch(request)).await;

    assert!(events.is_empty());
    assert_eq!(
        error.expect("validation should fail").kind,
        ProviderErrorKind::InvalidRequest
    );
    assert!(transport.captured_request.lock().expect("request lock").is_none());
}

#[tokio::test]
async fn configs_for_other_backends_are_rejected() {
    let adapter = HttpServerAdapter::with_transport(Arc::new(FakeServerTransport::default()));

    let request = DispatchRequest::new(
        vec![Turn::user("hi")],
        ProviderConfig::default_local_engine(),
    );
    let (events, error) = collect(adapter.dispatch(request)).await;

    assert!(events.is_empty());
    assert_eq!(
        error.expect("mismatched config should fail").kind,
        ProviderErrorKind::InvalidRequest
    );
}

#[tokio::test]
async fn probe_reports_version_and_model_presence() {
    let transport = Arc::new(FakeServerTransport::default());
    *transport.version.lock().expect("version lock") = Some(Ok("0.5.7".to_string()));
    *transport.tags.lock().expect("tags lock") =
        Some(Ok(vec!["llama3:8b".to_string(), "qwen2.5:14b".to_string()]));

    let adapter = HttpServerAdapter::with_transport(transport);
    let report = adapter
        .probe("http://localhost:11435", "qwen2.5:14b")
        .await
        .expect("probe should succeed");

    assert_eq!(report.version, "0.5.7");
    assert!(report.model_present);
}

#[tokio::test]
async fn probe_requires_an_exact_model_name_match() {
    let transport = Arc::new(FakeServerTransport::default());
    *transport.tags.lock().expect("tags lock") = Some(Ok(vec!["qwen2.5:7b".to_string()]));

    let adapter = HttpServerAdapter::with_transport(transport);
    let report = adapter
        .probe("http://localhost:11435", "qwen2.5:14b")
        .await
        .expect("probe should succeed");

    assert!(!report.model_present);
}

#[tokio::test]
async fn probe_surfaces_unreachable_endpoints() {
    let transport = Arc::new(FakeServerTransport::default());
    *transport.version.lock().expect("version lock") =
        Some(Err(ProviderError::endpoint_unreachable("connection refused")));

    let adapter = HttpServerAdapter::with_transport(transport);
    let error = adapter
        .probe("http://localhost:11435", "qwen2.5:14b")
        .await
        .expect_err("probe should fail");

    assert_eq!(error.kind, ProviderErrorKind::EndpointUnreachable);
    assert!(error.retryable);
}
