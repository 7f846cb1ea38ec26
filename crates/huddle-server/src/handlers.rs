//! HTTP and WebSocket handlers for Huddle.
//!
//! This module translates requests into registry operations and hands
//! validated connections to the echo relay.

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::BytesRejection,
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Path, Request, State,
    },
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use huddle_core::{Registry, RegistryError};
use huddle_protocol::{codec, CreateSessionResponse, JoinSessionRequest, JoinSessionResponse};
use huddle_transport::{relay_with, AxumChannel, ConnectionState, RelayEnd};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::service::TowerToHyperService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn, Instrument};

/// Shared server state.
pub struct AppState {
    /// The session registry.
    pub registry: Arc<Registry>,
    /// Server configuration.
    pub config: Config,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create new app state with an empty registry.
    #[must_use]
    pub fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            config,
            shutdown,
        }
    }
}

/// Run the HTTP/WebSocket server until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config, shutdown: CancellationToken) -> Result<()> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Huddle server listening on {}", addr);

    serve(listener, Arc::new(AppState::new(config, shutdown))).await
}

/// Serve requests on an already bound listener until shutdown.
///
/// Connections are driven by hyper directly so that its read buffer can be
/// sized to hold a full `max_header_bytes` header block. Open connections
/// are shut down gracefully and awaited before this returns.
///
/// # Errors
///
/// Currently infallible; accept errors are logged and retried.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let shutdown = state.shutdown.clone();

    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .max_buf_size(read_buffer_size(state.config.http.max_header_bytes));

    let app = build_router(state);
    let connections = TaskTracker::new();

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
            _ = shutdown.cancelled() => break,
        };

        let builder = builder.clone();
        let service = TowerToHyperService::new(app.clone());
        let shutdown = shutdown.clone();

        connections.spawn(async move {
            let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(e) = result {
                debug!(peer = %peer, error = %e, "Connection ended with error");
            }
        });
    }

    info!("Server stopped accepting connections");

    connections.close();
    connections.wait().await;
    Ok(())
}

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Room for the request line and framing on top of the header limit.
const HEADER_BUFFER_SLACK: usize = 8 * 1024;

/// hyper's default read buffer. Never shrink below it.
const MIN_READ_BUFFER: usize = 8 * 1024 + 4096 * 100;

/// hyper read buffer size for a given header limit.
///
/// The buffer must exceed the limit, otherwise hyper answers `431` itself
/// before [`limit_header_size`] sees the request.
fn read_buffer_size(max_header_bytes: usize) -> usize {
    max_header_bytes
        .saturating_add(HEADER_BUFFER_SLACK)
        .max(MIN_READ_BUFFER)
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_header_bytes = state.config.http.max_header_bytes;

    let sessions = Router::new()
        .route("/session/create", post(create_session))
        .route("/session/:session_id/join", post(join_session))
        .layer(TimeoutLayer::new(state.config.http.request_timeout()));

    Router::new()
        .merge(sessions)
        .route(
            "/session/:session_id/connect/:client_id",
            get(connect_handler),
        )
        .route("/socket", get(socket_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            max_header_bytes,
            limit_header_size,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject requests whose request line and headers exceed the limit.
async fn limit_header_size(State(limit): State<usize>, request: Request, next: Next) -> Response {
    let size = header_block_size(&request);
    if size > limit {
        warn!(size, limit, "Request headers too large");
        metrics::record_error("headers_too_large");
        return StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE.into_response();
    }

    next.run(request).await
}

/// Approximate on-the-wire size of the request line and header block.
fn header_block_size(request: &Request) -> usize {
    let target = request
        .uri()
        .path_and_query()
        .map_or(0, |p| p.as_str().len());
    // "METHOD target HTTP/1.1\r\n"
    let request_line = request.method().as_str().len() + target + 11;

    request
        .headers()
        .iter()
        // "name: value\r\n"
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum::<usize>()
        + request_line
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.registry.stats();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": stats.session_count,
        "clients": stats.client_count,
    }))
}

/// `POST /session/create`
async fn create_session(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let session_id = state.registry.create_session();
    metrics::record_session_created();

    info!(session = %session_id, "Session created");

    json_response(&CreateSessionResponse::new(session_id))
}

/// `POST /session/:session_id/join`
async fn join_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let session = state.registry.get_session(&session_id)?;

    let body = body.map_err(|e| ApiError::BodyRead(e.to_string()))?;
    let request: JoinSessionRequest = codec::decode(&body).map_err(ApiError::Decode)?;

    let client = session.join(request.name);
    metrics::record_client_joined();

    info!(session = %session_id, client = %client.id(), "Client joined");

    json_response(&JoinSessionResponse::new(client.id(), client.name()))
}

/// `GET /session/:session_id/connect/:client_id`
///
/// Session and client are validated before the upgrade is attempted, so an
/// unknown pair never receives a `101`.
async fn connect_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, client_id)): Path<(String, String)>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let mut conn_state = ConnectionState::Unvalidated;

    if let Err(e) = state.registry.validate(&session_id, &client_id) {
        conn_state.close();
        metrics::record_rejection(match e {
            RegistryError::SessionNotFound(_) => "session_not_found",
            RegistryError::ClientNotFound { .. } => "client_not_found",
        });
        debug!(
            session = %session_id,
            client = %client_id,
            state = %conn_state,
            "Connect rejected"
        );
        return Err(e.into());
    }

    let ws = ws.map_err(|e| ApiError::Upgrade(e.to_string()))?;

    if !is_same_origin(&headers) {
        return Err(ApiError::Forbidden(origin_of(&headers)));
    }

    let shutdown = state.shutdown.clone();
    let span = tracing::debug_span!(
        "relay",
        endpoint = "connect",
        session = %session_id,
        client = %client_id
    );

    Ok(ws
        .on_failed_upgrade(|e: axum::Error| {
            warn!(error = %e, "WebSocket upgrade failed");
            metrics::record_error("upgrade");
        })
        .on_upgrade(move |socket| {
            run_relay(socket, "connect", conn_state, shutdown).instrument(span)
        }))
}

/// `GET /socket`
///
/// Unauthenticated echo endpoint. No session or client is required and
/// connections from any origin are accepted.
async fn socket_handler(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let ws = ws.map_err(|e| ApiError::Upgrade(e.to_string()))?;

    let shutdown = state.shutdown.clone();
    let span = tracing::debug_span!("relay", endpoint = "socket");

    Ok(ws
        .on_failed_upgrade(|e: axum::Error| {
            warn!(error = %e, "WebSocket upgrade failed");
            metrics::record_error("upgrade");
        })
        .on_upgrade(move |socket| {
            run_relay(socket, "socket", ConnectionState::Unvalidated, shutdown).instrument(span)
        }))
}

/// Echo messages on an upgraded socket until it closes.
///
/// `conn_state` is the state the request reached before the upgrade.
async fn run_relay(
    socket: WebSocket,
    endpoint: &'static str,
    mut conn_state: ConnectionState,
    shutdown: CancellationToken,
) {
    let _metrics_guard = ConnectionMetricsGuard::new(endpoint);

    if !conn_state.advance(ConnectionState::Upgraded) {
        warn!(state = %conn_state, "Upgraded socket in unexpected state, dropping");
        metrics::record_error("connection_state");
        return;
    }
    debug!(state = %conn_state, "WebSocket connected");

    let report = relay_with(AxumChannel::new(socket), conn_state, shutdown, |kind, len| {
        metrics::record_message(len, kind.as_str());
    })
    .await;

    match &report.end {
        RelayEnd::PeerClosed => debug!("Peer closed connection"),
        RelayEnd::Shutdown => debug!("Connection closed for shutdown"),
        RelayEnd::Failed(e) => {
            debug!(error = %e, "Relay I/O failure");
            metrics::record_error("relay_io");
        }
        RelayEnd::NotUpgraded(_) => metrics::record_error("connection_state"),
    }

    debug!(
        state = %report.state,
        messages = report.messages,
        bytes = report.bytes,
        "WebSocket disconnected"
    );
}

/// Encode a JSON response body.
fn json_response<T: Serialize>(body: &T) -> Result<Response, ApiError> {
    let data = codec::encode(body).map_err(ApiError::Encode)?;
    Ok(([(header::CONTENT_TYPE, huddle_protocol::CONTENT_TYPE)], data).into_response())
}

/// Check that the `Origin` header, if any, names the requested host.
///
/// Requests without an `Origin` header are not from a browser and pass.
fn is_same_origin(headers: &HeaderMap) -> bool {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return true;
    };
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Some(host) = headers.get(header::HOST).and_then(|h| h.to_str().ok()) else {
        return false;
    };

    let authority = origin.split_once("://").map_or(origin, |(_, rest)| rest);
    let authority = authority.split('/').next().unwrap_or(authority);

    authority.eq_ignore_ascii_case(host)
}

fn origin_of(headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|o| o.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Method};
    use futures_util::{SinkExt, Stream, StreamExt};
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};
    use tower::ServiceExt;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn make_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default(), CancellationToken::new()))
    }

    fn post_request(uri: &str, body: impl Into<Body>) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(body.into())
            .unwrap()
    }

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_session() {
        let state = make_state();
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(post_request("/session/create", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            huddle_protocol::CONTENT_TYPE
        );

        let created: CreateSessionResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(state.registry.session_exists(&created.id));
    }

    #[tokio::test]
    async fn test_join_session() {
        let state = make_state();
        let session_id = state.registry.create_session();
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(post_request(
                &format!("/session/{}/join", session_id),
                r#"{"name":"alice"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let joined: JoinSessionResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(joined.name, "alice");
        assert!(state.registry.validate(&session_id, &joined.id).is_ok());
    }

    #[tokio::test]
    async fn test_join_with_empty_name() {
        let state = make_state();
        let session_id = state.registry.create_session();
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(post_request(
                &format!("/session/{}/join", session_id),
                r#"{"name":""}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(value["name"], "");
        assert!(value["id"].is_string());
    }

    #[tokio::test]
    async fn test_join_without_name_field() {
        let state = make_state();
        let session_id = state.registry.create_session();

        for body in ["{}", r#"{"nom":"alice"}"#] {
            let app = build_router(Arc::clone(&state));
            let response = app
                .oneshot(post_request(&format!("/session/{}/join", session_id), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", body);

            let joined: JoinSessionResponse =
                serde_json::from_slice(&body_bytes(response).await).unwrap();
            assert_eq!(joined.name, "");
            assert!(state.registry.validate(&session_id, &joined.id).is_ok());
        }

        assert_eq!(state.registry.get_session(&session_id).unwrap().client_count(), 2);
    }

    #[tokio::test]
    async fn test_join_unknown_session() {
        let app = build_router(make_state());

        let response = app
            .oneshot(post_request("/session/bogus/join", r#"{"name":"alice"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_join_malformed_body() {
        let state = make_state();
        let session_id = state.registry.create_session();

        for body in ["", "{", r#"{"name":42}"#, "null"] {
            let app = build_router(Arc::clone(&state));
            let response = app
                .oneshot(post_request(&format!("/session/{}/join", session_id), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", body);
            assert!(body_bytes(response).await.is_empty());
        }

        // Nothing was joined by the failed requests
        assert_eq!(state.registry.get_session(&session_id).unwrap().client_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_unknown_ids_is_404() {
        let state = make_state();
        let session_id = state.registry.create_session();
        let client = state.registry.join(&session_id, "alice").unwrap();

        let uris = [
            format!("/session/bogus/connect/{}", client.id()),
            format!("/session/{}/connect/bogus", session_id),
        ];

        for uri in uris {
            let app = build_router(Arc::clone(&state));
            let response = app.oneshot(get_request(&uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_connect_without_handshake_is_500() {
        let state = make_state();
        let session_id = state.registry.create_session();
        let client = state.registry.join(&session_id, "alice").unwrap();
        let app = build_router(Arc::clone(&state));

        let response = app
            .oneshot(get_request(&format!(
                "/session/{}/connect/{}",
                session_id,
                client.id()
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_socket_without_handshake_is_500() {
        let app = build_router(make_state());

        let response = app.oneshot(get_request("/socket")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let state = make_state();
        let session_id = state.registry.create_session();
        state.registry.join(&session_id, "alice").unwrap();
        let app = build_router(state);

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["sessions"], 1);
        assert_eq!(value["clients"], 1);
    }

    #[tokio::test]
    async fn test_oversized_headers_rejected() {
        let mut config = Config::default();
        config.http.max_header_bytes = 1024;
        let app = build_router(Arc::new(AppState::new(config, CancellationToken::new())));

        let mut request = get_request("/health");
        request.headers_mut().insert(
            "x-padding",
            HeaderValue::from_str(&"a".repeat(2048)).unwrap(),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    }

    #[test]
    fn test_read_buffer_holds_header_limit() {
        assert_eq!(read_buffer_size(1024), MIN_READ_BUFFER);
        assert!(read_buffer_size(1 << 20) > 1 << 20);
        assert_eq!(read_buffer_size(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_same_origin() {
        let mut headers = HeaderMap::new();
        assert!(is_same_origin(&headers));

        headers.insert(header::HOST, HeaderValue::from_static("example.com:8080"));
        headers.insert(header::ORIGIN, HeaderValue::from_static("http://example.com:8080"));
        assert!(is_same_origin(&headers));

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://EXAMPLE.com:8080"));
        assert!(is_same_origin(&headers));

        headers.insert(header::ORIGIN, HeaderValue::from_static("http://evil.example"));
        assert!(!is_same_origin(&headers));
        assert_eq!(origin_of(&headers), "http://evil.example");

        headers.remove(header::HOST);
        headers.insert(header::ORIGIN, HeaderValue::from_static("http://example.com:8080"));
        assert!(!is_same_origin(&headers));
    }

    // Real sockets from here on: the upgrade needs a hyper connection.

    async fn spawn_server() -> (SocketAddr, Arc<AppState>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = make_state();
        tokio::spawn(serve(listener, Arc::clone(&state)));
        (addr, state)
    }

    async fn next_data<S>(ws: &mut S) -> Message
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        loop {
            let msg = timeout(TIMEOUT, ws.next())
                .await
                .expect("timeout waiting for message")
                .expect("stream closed")
                .expect("ws error");
            if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
                return msg;
            }
        }
    }

    /// Send a raw `GET /health` with one padding header, return the status.
    async fn health_status_with_padding(addr: SocketAddr, padding: usize) -> u16 {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET /health HTTP/1.1\r\nhost: {}\r\nx-padding: {}\r\nconnection: close\r\n\r\n",
            addr,
            "a".repeat(padding)
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        let mut buf = [0u8; 1024];
        while !response.windows(2).any(|w| w == b"\r\n") {
            let n = timeout(TIMEOUT, stream.read(&mut buf))
                .await
                .expect("timeout waiting for response")
                .unwrap();
            assert!(n > 0, "connection closed before status line");
            response.extend_from_slice(&buf[..n]);
        }

        let status_line = String::from_utf8_lossy(&response);
        status_line.split(' ').nth(1).unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_default_header_limit_is_enforced_by_middleware() {
        let (addr, state) = spawn_server().await;
        let limit = state.config.http.max_header_bytes;
        assert_eq!(limit, 1 << 20);

        // Well past hyper's default read buffer, still under the limit
        assert_eq!(health_status_with_padding(addr, 900 * 1024).await, 200);

        // Just over the limit: hyper still reads it, the middleware refuses
        assert_eq!(health_status_with_padding(addr, limit + 1024).await, 431);
    }

    #[tokio::test]
    async fn test_create_join_connect_echo() {
        let (addr, state) = spawn_server().await;

        let session_id = state.registry.create_session();
        let client = state.registry.join(&session_id, "alice").unwrap();

        let url = format!("ws://{}/session/{}/connect/{}", addr, session_id, client.id());
        let (mut ws, response) = connect_async(url).await.unwrap();
        assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);

        ws.send(Message::Text("ping".to_string())).await.unwrap();
        assert_eq!(next_data(&mut ws).await, Message::Text("ping".to_string()));

        ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
        assert_eq!(next_data(&mut ws).await, Message::Binary(vec![1, 2, 3]));

        ws.close(None).await.unwrap();

        // A bogus client is refused before any upgrade
        let url = format!("ws://{}/session/{}/connect/bogus", addr, session_id);
        match connect_async(url).await {
            Err(WsError::Http(response)) => assert_eq!(response.status(), StatusCode::NOT_FOUND),
            other => panic!("Expected 404, got {:?}", other.map(|(_, r)| r.status())),
        }
    }

    #[tokio::test]
    async fn test_reconnect_after_close() {
        let (addr, state) = spawn_server().await;
        let session_id = state.registry.create_session();
        let client = state.registry.join(&session_id, "bob").unwrap();
        let url = format!("ws://{}/session/{}/connect/{}", addr, session_id, client.id());

        for round in 0..2 {
            let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
            let text = format!("round-{}", round);
            ws.send(Message::Text(text.clone())).await.unwrap();
            assert_eq!(next_data(&mut ws).await, Message::Text(text));
            ws.close(None).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_socket_echo_any_origin() {
        let (addr, _state) = spawn_server().await;

        let mut request = format!("ws://{}/socket", addr)
            .into_client_request()
            .unwrap();
        request
            .headers_mut()
            .insert(header::ORIGIN, HeaderValue::from_static("http://elsewhere.example"));

        let (mut ws, _) = connect_async(request).await.unwrap();

        ws.send(Message::Binary(vec![0xde, 0xad])).await.unwrap();
        assert_eq!(next_data(&mut ws).await, Message::Binary(vec![0xde, 0xad]));
    }

    #[tokio::test]
    async fn test_connect_rejects_cross_origin() {
        let (addr, state) = spawn_server().await;
        let session_id = state.registry.create_session();
        let client = state.registry.join(&session_id, "eve").unwrap();

        let mut request = format!("ws://{}/session/{}/connect/{}", addr, session_id, client.id())
            .into_client_request()
            .unwrap();
        request
            .headers_mut()
            .insert(header::ORIGIN, HeaderValue::from_static("http://elsewhere.example"));

        match connect_async(request).await {
            Err(WsError::Http(response)) => assert_eq!(response.status(), StatusCode::FORBIDDEN),
            other => panic!("Expected 403, got {:?}", other.map(|(_, r)| r.status())),
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_relays() {
        let (addr, state) = spawn_server().await;

        let (mut ws, _) = connect_async(format!("ws://{}/socket", addr)).await.unwrap();
        ws.send(Message::Text("hello".to_string())).await.unwrap();
        assert_eq!(next_data(&mut ws).await, Message::Text("hello".to_string()));

        state.shutdown.cancel();

        assert!(matches!(next_data(&mut ws).await, Message::Close(_)));
    }
}
