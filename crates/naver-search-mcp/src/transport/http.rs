//! Streamable HTTP transport: POST submit, GET push stream, DELETE terminate.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json as AxumJson, Response,
    },
    routing::{get, post},
    Router,
};
use futures::Stream;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::protocol::validator::{parse_message, recover_id};
use crate::session::{CloseReason, SessionManager};
use crate::types::{McpError, McpResult, RequestId};

/// Session id header, read on every request and set on every POST response.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

const INVALID_SESSION: &str = "Invalid or missing session ID";

/// HTTP transport serving every session from one listener.
pub struct HttpTransport {
    manager: Arc<SessionManager>,
    idle_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            idle_timeout: None,
        }
    }

    /// Close sessions idle for longer than `timeout`. Disabled when `None`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn router(&self) -> Router {
        router(self.manager.clone())
    }

    /// Serve until Ctrl-C, then close every session and drain connections.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("Streamable HTTP transport listening on http://{addr}/mcp");

        let reaper = self
            .idle_timeout
            .map(|timeout| spawn_reaper(self.manager.clone(), timeout));

        let manager = self.manager.clone();
        let shutdown = async move {
            shutdown_signal().await;
            // Ending the push streams lets graceful shutdown finish.
            let closed = manager.close_all(CloseReason::Shutdown);
            tracing::info!("Shutting down, closed {closed} session(s)");
        };

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| McpError::Transport(e.to_string()));

        if let Some(reaper) = reaper {
            reaper.abort();
        }
        served
    }
}

/// Build the router. Exposed separately so tests can drive it in-process.
pub fn router(manager: Arc<SessionManager>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)]);

    let mcp = post(handle_post).get(handle_get).delete(handle_delete);

    Router::new()
        .route("/mcp", mcp.clone())
        .route("/mcp/", mcp)
        .route("/health", get(handle_health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(manager)
}

/// Submit one JSON-RPC message, creating a session on `initialize`.
async fn handle_post(
    State(manager): State<Arc<SessionManager>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message = match parse_message(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Rejected unparseable body: {e}");
            return rpc_error(e, recover_id(&body));
        }
    };

    let session = match manager.resolve_or_create(session_header(&headers), &message) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Rejected request: {e}");
            return rpc_error(e, message.id());
        }
    };

    let engine = session.engine().clone();
    let mut response = match engine.handle_message(message).await {
        Some(reply) => (StatusCode::OK, AxumJson(reply)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    set_session_header(&mut response, session.id());
    response
}

/// Open the session's push stream. One per session.
async fn handle_get(State(manager): State<Arc<SessionManager>>, headers: HeaderMap) -> Response {
    let Ok(session) = manager.resolve(session_header(&headers)) else {
        return invalid_session();
    };

    let rx = match session.engine().subscribe() {
        Ok(rx) => rx,
        Err(e @ McpError::StreamConflict) => {
            return (StatusCode::CONFLICT, e.to_string()).into_response();
        }
        Err(_) => return invalid_session(),
    };

    tracing::debug!("Push stream attached to session {}", session.id());

    let guard = PushGuard {
        manager: manager.clone(),
        session_id: session.id().to_string(),
    };
    let mut response = Sse::new(push_stream(rx, guard))
        .keep_alive(KeepAlive::default())
        .into_response();
    set_session_header(&mut response, session.id());
    response
}

async fn handle_delete(State(manager): State<Arc<SessionManager>>, headers: HeaderMap) -> Response {
    match session_header(&headers) {
        Some(id) if manager.close(id, CloseReason::Terminated) => StatusCode::OK.into_response(),
        _ => invalid_session(),
    }
}

async fn handle_health(State(manager): State<Arc<SessionManager>>) -> AxumJson<Value> {
    AxumJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": manager.len(),
    }))
}

/// Closes the session when its push stream is dropped.
struct PushGuard {
    manager: Arc<SessionManager>,
    session_id: String,
}

impl Drop for PushGuard {
    fn drop(&mut self) {
        if self
            .manager
            .close(&self.session_id, CloseReason::TransportClosed)
        {
            tracing::debug!("Push stream for {} dropped", self.session_id);
        }
    }
}

fn push_stream(
    mut rx: broadcast::Receiver<Value>,
    guard: PushGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let _guard = guard;
        loop {
            match rx.recv().await {
                Ok(message) => {
                    yield Ok(Event::default().event("message").data(message.to_string()));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Push stream lagged, skipped {skipped} notification(s)");
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn spawn_reaper(manager: Arc<SessionManager>, max_idle: Duration) -> JoinHandle<()> {
    let period = (max_idle / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let reaped = manager.reap_idle(max_idle);
            if !reaped.is_empty() {
                tracing::info!("Reaped {} idle session(s)", reaped.len());
            }
        }
    })
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = tokio::signal::ctrl_c() => {},
                }
                return;
            }
            Err(e) => tracing::warn!("Cannot listen for SIGTERM: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
}

fn set_session_header(response: &mut Response, session_id: &str) {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }
}

fn rpc_error(error: McpError, id: RequestId) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AxumJson(error.to_json_rpc_error(id)),
    )
        .into_response()
}

fn invalid_session() -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        INVALID_SESSION,
    )
        .into_response()
}
