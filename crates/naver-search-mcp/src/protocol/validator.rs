//! JSON-RPC message validation per MCP spec.

use serde_json::Value;

use crate::types::{
    JsonRpcMessage, JsonRpcRequest, McpError, McpResult, RequestId, JSONRPC_VERSION,
};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    check_version(&request.jsonrpc)?;

    if request.method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Decode an HTTP body into a single JSON-RPC message.
pub fn parse_message(body: &[u8]) -> McpResult<JsonRpcMessage> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    serde_json::from_slice(body).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Best-effort `id` of a body that failed to parse as a message, so the
/// error reply can still be correlated. `Null` when there is none.
pub fn recover_id(body: &[u8]) -> RequestId {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("id").cloned())
        .and_then(|id| serde_json::from_value(id).ok())
        .unwrap_or(RequestId::Null)
}

fn check_version(version: &str) -> McpResult<()> {
    if version != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{version}\""
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_message(br#"{"broken":"#).unwrap_err().code(), -32700);
        assert_eq!(parse_message(b"  \n").unwrap_err().code(), -32700);
        assert!(parse_message(br#"{"jsonrpc":"2.0","id":1,"method":"#).is_err());
    }

    #[test]
    fn test_recover_id_from_non_message() {
        assert!(parse_message(br#"{"id":5}"#).is_err());
        assert_eq!(recover_id(br#"{"id":5}"#), RequestId::Number(5));
        assert_eq!(recover_id(br#"{"id":"a","x":1}"#), RequestId::String("a".into()));
        assert_eq!(recover_id(br#"{"id":{"nested":true}}"#), RequestId::Null);
        assert_eq!(recover_id(b"{not json"), RequestId::Null);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let req = JsonRpcRequest {
            jsonrpc: "1.0".into(),
            id: RequestId::Number(1),
            method: "ping".into(),
            params: None,
        };
        assert_eq!(validate_request(&req).unwrap_err().code(), -32600);
    }
}
