//! HTTP boundary tests, driven in-process through the axum router.

#![cfg(feature = "http")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use naver_search_mcp::session::SessionManager;
use naver_search_mcp::tools::{Dispatcher, ToolEntry, ToolGroup, ToolHandler};
use naver_search_mcp::transport::{router, SESSION_ID_HEADER};
use naver_search_mcp::types::{McpError, McpResult, ToolDefinition};

struct Flaky;

#[async_trait]
impl ToolHandler for Flaky {
    async fn call(&self, args: Value) -> McpResult<Value> {
        if args.get("fail").is_some() {
            return Err(McpError::InternalError("provider unavailable".into()));
        }
        Ok(json!({ "items": [] }))
    }
}

fn app() -> (Router, Arc<SessionManager>) {
    let group = ToolGroup::new("test").with(ToolEntry::new(
        ToolDefinition {
            name: "flaky".into(),
            description: None,
            input_schema: json!({ "type": "object" }),
        },
        Flaky,
    ));
    let manager = Arc::new(SessionManager::new(Arc::new(
        Dispatcher::from_groups([group]).unwrap(),
    )));
    (router(manager.clone()), manager)
}

fn init_body() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": { "name": "http-test", "version": "1.0" }
        }
    })
}

fn post(path: &str, session: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header(SESSION_ID_HEADER, id);
    }
    builder.body(body.into()).unwrap()
}

fn post_json(session: Option<&str>, body: &Value) -> Request<Body> {
    post("/mcp", session, body.to_string())
}

fn bare(method: Method, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/mcp");
    if let Some(id) = session {
        builder = builder.header(SESSION_ID_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn session_id(response: &Response) -> String {
    response
        .headers()
        .get(SESSION_ID_HEADER)
        .expect("session header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Initialize a session over HTTP and return its id.
async fn initialize(app: &Router) -> String {
    let response = app.clone().oneshot(post_json(None, &init_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_id(&response)
}

#[tokio::test]
async fn test_initialize_returns_session_header() {
    let (app, manager) = app();
    let response = app.clone().oneshot(post_json(None, &init_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let id = session_id(&response);
    assert!(manager.get(&id).is_some());

    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["serverInfo"]["name"], "naver-search");
}

#[tokio::test]
async fn test_missing_session_is_bad_request() {
    let (app, manager) = app();
    let ping = json!({ "jsonrpc": "2.0", "id": 7, "method": "ping" });
    let response = app.oneshot(post_json(None, &ping)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], 7);
    assert_eq!(body["error"]["code"], -32000);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_bad_request() {
    let (app, manager) = app();
    let response = app
        .oneshot(post_json(Some("f00"), &init_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32000);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (app, manager) = app();
    let response = app.oneshot(post("/mcp", None, "{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_non_message_json_echoes_id() {
    let (app, manager) = app();
    let response = app.oneshot(post("/mcp", None, r#"{"id":5}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], 5);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_rejected_initialize_opens_no_session() {
    let (app, manager) = app();
    let mut init = init_body();
    init["jsonrpc"] = json!("1.0");

    let response = app.oneshot(post_json(None, &init)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(SESSION_ID_HEADER).is_none());

    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["error"]["code"], -32600);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let (app, _) = app();
    let id = initialize(&app).await;

    let notif = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let response = app.oneshot(post_json(Some(&id), &notif)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(session_id(&response), id);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_tool_errors_are_transport_success() {
    let (app, _) = app();
    let id = initialize(&app).await;

    let failing = json!({
        "jsonrpc": "2.0", "id": 2, "method": "tools/call",
        "params": { "name": "flaky", "arguments": { "fail": true } }
    });
    let response = app.clone().oneshot(post_json(Some(&id), &failing)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["result"]["isError"], true);

    let unknown = json!({
        "jsonrpc": "2.0", "id": 3, "method": "tools/call",
        "params": { "name": "nope", "arguments": {} }
    });
    let response = app.clone().oneshot(post_json(Some(&id), &unknown)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["content"][0]["text"], "Error: Unknown tool: nope");

    let ok = json!({
        "jsonrpc": "2.0", "id": 4, "method": "tools/call",
        "params": { "name": "flaky", "arguments": {} }
    });
    let response = app.oneshot(post_json(Some(&id), &ok)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["result"].get("isError").is_none());
}

#[tokio::test]
async fn test_trailing_slash_route() {
    let (app, _) = app();
    let response = app
        .oneshot(post("/mcp/", None, init_body().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_and_delete_require_session() {
    let (app, _) = app();
    for method in [Method::GET, Method::DELETE] {
        let response = app.clone().oneshot(bare(method, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body_text(response).await, "Invalid or missing session ID");
    }

    let response = app.oneshot(bare(Method::GET, Some("stale"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_terminates_session() {
    let (app, manager) = app();
    let id = initialize(&app).await;

    let response = app.clone().oneshot(bare(Method::DELETE, Some(&id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(manager.is_empty());

    let ping = json!({ "jsonrpc": "2.0", "id": 5, "method": "ping" });
    let response = app.clone().oneshot(post_json(Some(&id), &ping)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(bare(Method::DELETE, Some(&id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_single_push_stream_and_drop_closes_session() {
    let (app, manager) = app();
    let id = initialize(&app).await;

    let stream = app.clone().oneshot(bare(Method::GET, Some(&id))).await.unwrap();
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(
        stream.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let second = app.clone().oneshot(bare(Method::GET, Some(&id))).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    drop(stream);
    assert!(manager.get(&id).is_none());

    let ping = json!({ "jsonrpc": "2.0", "id": 6, "method": "ping" });
    let response = app.oneshot(post_json(Some(&id), &ping)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_sessions() {
    let (app, _) = app();
    initialize(&app).await;
    initialize(&app).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 2);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
