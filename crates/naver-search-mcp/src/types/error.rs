//! Error types and JSON-RPC error codes for the MCP server.

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-defined error codes (JSON-RPC reserves -32000..=-32099 for these).
pub mod mcp_error_codes {
    /// Boundary rejection: no usable session for this request.
    pub const BAD_REQUEST: i32 = -32000;
    pub const SESSION_CLOSED: i32 = -32001;
    pub const STREAM_CONFLICT: i32 = -32002;
    pub const TOOL_FAILED: i32 = -32003;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// No session header and the message is not an `initialize` request.
    #[error("Bad Request: No valid session ID provided or not an initialization request")]
    MissingSession,

    /// Session header present but not in the session table.
    #[error("Bad Request: Unknown session ID: {0}")]
    UnknownSession(String),

    #[error("Session closed: {0}")]
    SessionClosed(String),

    #[error("Conflict: only one push stream is allowed per session")]
    StreamConflict,

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Arguments are required")]
    MissingArguments,

    #[error("Duplicate tool name {name:?} registered by group {group:?}")]
    DuplicateTool { name: String, group: String },

    #[error("Tool {0} failed unexpectedly")]
    ToolPanicked(String),

    #[error(transparent)]
    Provider(#[from] naver_search::NaverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) | McpError::MissingArguments => INVALID_PARAMS,
            McpError::InternalError(_) | McpError::Config(_) => INTERNAL_ERROR,
            McpError::MissingSession | McpError::UnknownSession(_) => BAD_REQUEST,
            McpError::SessionClosed(_) => SESSION_CLOSED,
            McpError::StreamConflict => STREAM_CONFLICT,
            McpError::ToolNotFound(_) => METHOD_NOT_FOUND,
            McpError::DuplicateTool { .. } => INTERNAL_ERROR,
            McpError::ToolPanicked(_) | McpError::Provider(_) => TOOL_FAILED,
            McpError::Transport(_) | McpError::Io(_) => INTERNAL_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: None,
            },
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
