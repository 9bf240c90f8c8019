//! Per-session protocol engine. Interprets JSON-RPC messages for one session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::tools::Dispatcher;
use crate::types::*;

use super::negotiation::{parse_initialize_params, NegotiatedCapabilities};
use super::validator::validate_request;

const PUSH_CHANNEL_CAPACITY: usize = 64;
const LOGGER_NAME: &str = "naver-search";

/// Lifecycle of an engine. Engines are created already `Ready` because the
/// session manager only builds one after seeing a valid `initialize` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Closed,
}

/// Protocol engine bound to a single session for its whole lifetime.
///
/// Concurrent `tools/call` requests on the same engine are not serialized;
/// only the small pieces of per-session state sit behind locks, and no lock
/// is held across an await.
pub struct ProtocolEngine {
    session_id: String,
    dispatcher: Arc<Dispatcher>,
    capabilities: Mutex<NegotiatedCapabilities>,
    log_level: Mutex<LogLevel>,
    push: Mutex<Option<broadcast::Sender<Value>>>,
    stream_attached: AtomicBool,
    closed: AtomicBool,
}

impl ProtocolEngine {
    pub fn new(session_id: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        let (push, _) = broadcast::channel(PUSH_CHANNEL_CAPACITY);
        Self {
            session_id: session_id.into(),
            dispatcher,
            capabilities: Mutex::new(NegotiatedCapabilities::default()),
            log_level: Mutex::new(LogLevel::default()),
            push: Mutex::new(Some(push)),
            stream_attached: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> EngineState {
        if self.closed.load(Ordering::Acquire) {
            EngineState::Closed
        } else {
            EngineState::Ready
        }
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.capabilities).initialized
    }

    pub fn log_level(&self) -> LogLevel {
        *lock(&self.log_level)
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        if self.state() == EngineState::Closed {
            return match msg {
                JsonRpcMessage::Request(req) => Some(error_value(
                    McpError::SessionClosed(self.session_id.clone()),
                    req.id,
                )),
                _ => None,
            };
        }

        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif);
                None
            }
            _ => {
                tracing::warn!(
                    "Session {}: ignoring unexpected client response",
                    self.session_id
                );
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return error_value(e, request.id);
        }

        let id = request.id.clone();
        match self.dispatch_request(request).await {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => error_value(e, id),
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            INITIALIZE_METHOD => self.handle_initialize(request.params.as_ref()),
            "ping" => Ok(Value::Object(serde_json::Map::new())),

            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,

            "logging/setLevel" => self.handle_set_level(request.params),

            _ => Err(McpError::MethodNotFound(request.method)),
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                lock(&self.capabilities).mark_initialized();
            }
            "notifications/cancelled" => {
                // In-flight calls always run to completion.
                let cancelled = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                if let Some(CancelledParams { request_id, reason }) = cancelled {
                    tracing::debug!(
                        "Session {}: cancellation of request {request_id} ignored ({})",
                        self.session_id,
                        reason.as_deref().unwrap_or("no reason")
                    );
                }
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_initialize(&self, params: Option<&Value>) -> McpResult<Value> {
        let init_params = parse_initialize_params(params)?;
        let result = lock(&self.capabilities).negotiate(init_params)?;
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: self.list_operations().to_vec(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

        let result = self.invoke(&call_params.name, call_params.arguments).await;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_set_level(&self, params: Option<Value>) -> McpResult<Value> {
        let SetLevelParams { level } = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Log level required".to_string()))?;

        *lock(&self.log_level) = level;
        tracing::debug!("Session {}: log level set to {level:?}", self.session_id);
        Ok(Value::Object(serde_json::Map::new()))
    }

    /// Every registered tool in registration order; identical for all sessions.
    pub fn list_operations(&self) -> &[ToolDefinition] {
        self.dispatcher.registry().list_tools()
    }

    /// Run a tool. Failures of any kind come back as an `isError` result,
    /// never as a JSON-RPC error, so the session stays usable.
    pub async fn invoke(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        tracing::info!("Session {}: executing tool {name}", self.session_id);

        let outcome = if !self.dispatcher.contains(name) {
            Err(McpError::ToolNotFound(name.to_string()))
        } else {
            match arguments {
                None | Some(Value::Null) => Err(McpError::MissingArguments),
                Some(args) => self.dispatcher.call(name, args).await,
            }
        };

        match outcome {
            Ok(value) => {
                tracing::info!("Session {}: tool {name} executed successfully", self.session_id);
                self.log(LogLevel::Info, json!({ "tool": name, "status": "ok" }));
                ToolCallResult::json(&value)
            }
            Err(e) => {
                tracing::warn!("Session {}: tool {name} failed: {e}", self.session_id);
                self.log(
                    LogLevel::Error,
                    json!({ "tool": name, "status": "error", "error": e.to_string() }),
                );
                ToolCallResult::error(e)
            }
        }
    }

    /// Attach the session's single push stream.
    pub fn subscribe(&self) -> McpResult<broadcast::Receiver<Value>> {
        if self.state() == EngineState::Closed {
            return Err(McpError::SessionClosed(self.session_id.clone()));
        }
        if self.stream_attached.swap(true, Ordering::AcqRel) {
            return Err(McpError::StreamConflict);
        }
        lock(&self.push)
            .as_ref()
            .map(broadcast::Sender::subscribe)
            .ok_or_else(|| McpError::SessionClosed(self.session_id.clone()))
    }

    /// Push a notification to the attached stream. Nothing is queued when no
    /// stream is attached.
    pub fn notify(&self, method: &str, params: Option<Value>) {
        let Some(tx) = lock(&self.push).clone() else {
            return;
        };
        match serde_json::to_value(JsonRpcNotification::new(method, params)) {
            Ok(value) => {
                // No receiver is not an error: results may outlive their observer.
                let _ = tx.send(value);
            }
            Err(e) => tracing::error!("Failed to encode notification {method}: {e}"),
        }
    }

    fn log(&self, level: LogLevel, data: Value) {
        if level < self.log_level() {
            return;
        }
        let params = LogMessageParams {
            level,
            logger: Some(LOGGER_NAME.to_string()),
            data,
        };
        match serde_json::to_value(params) {
            Ok(params) => self.notify(LOG_MESSAGE_METHOD, Some(params)),
            Err(e) => tracing::error!("Failed to encode log message: {e}"),
        }
    }

    /// Move to `Closed` and end the push stream. Returns false if already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        lock(&self.push).take();
        tracing::debug!("Engine for session {} closed", self.session_id);
        true
    }
}

fn error_value(error: McpError, id: RequestId) -> Value {
    serde_json::to_value(error.to_json_rpc_error(id)).unwrap_or_default()
}

/// Engine locks guard plain data, so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
