//! JSON-RPC 2.0 message types for the MCP protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name of the handshake request that opens a session.
pub const INITIALIZE_METHOD: &str = "initialize";

/// Unique request identifier. Can be string, number, or null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Union type for any JSON-RPC message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Error(JsonRpcError),
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// True only for an `initialize` request; an `initialize` notification
    /// cannot open a session because it expects no reply.
    pub fn is_initialize_request(&self) -> bool {
        matches!(self, JsonRpcMessage::Request(req) if req.method == INITIALIZE_METHOD)
    }

    /// The id to echo back in an error envelope, if the message carries one.
    pub fn id(&self) -> RequestId {
        match self {
            JsonRpcMessage::Request(req) => req.id.clone(),
            JsonRpcMessage::Response(resp) => resp.id.clone(),
            JsonRpcMessage::Error(err) => err.id.clone(),
            JsonRpcMessage::Notification(_) => RequestId::Null,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request(req) => Some(&req.method),
            JsonRpcMessage::Notification(notif) => Some(&notif.method),
            _ => None,
        }
    }
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

impl JsonRpcError {
    pub fn new(id: RequestId, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code,
                message,
                data: None,
            },
        }
    }
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> JsonRpcMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_initialize_detection() {
        let init = parse(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}));
        assert!(init.is_initialize_request());

        let list = parse(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
        assert!(!list.is_initialize_request());

        let notif = parse(json!({"jsonrpc": "2.0", "method": "initialize"}));
        assert!(matches!(notif, JsonRpcMessage::Notification(_)));
        assert!(!notif.is_initialize_request());
    }

    #[test]
    fn test_id_echo() {
        let req = parse(json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"}));
        assert_eq!(req.id(), RequestId::String("abc".into()));

        let notif = parse(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
        assert_eq!(notif.id(), RequestId::Null);
        assert_eq!(notif.method(), Some("notifications/initialized"));
    }
}
