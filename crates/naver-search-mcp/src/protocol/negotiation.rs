//! MCP capability negotiation during initialization.

use serde_json::Value;

use crate::types::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, McpError, McpResult,
    MCP_VERSION, SUPPORTED_VERSIONS,
};

/// Parse `initialize` params, rejecting anything that cannot open a session.
pub fn parse_initialize_params(params: Option<&Value>) -> McpResult<InitializeParams> {
    let params = params
        .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;
    serde_json::from_value(params.clone()).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Stored client capabilities after negotiation.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub client_info: Option<Implementation>,
    pub protocol_version: Option<String>,
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    /// Negotiate once per engine; a second `initialize` is a protocol error.
    pub fn negotiate(&mut self, params: InitializeParams) -> McpResult<InitializeResult> {
        if self.protocol_version.is_some() {
            return Err(McpError::InvalidRequest(
                "Server already initialized".to_string(),
            ));
        }

        let version = if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version.clone()
        } else {
            tracing::warn!(
                "Client requested protocol version {}, answering with {}",
                params.protocol_version,
                MCP_VERSION
            );
            MCP_VERSION.to_string()
        };

        tracing::info!(
            "Initialized with client: {} v{} (protocol {version})",
            params.client_info.name,
            params.client_info.version
        );

        self.client = params.capabilities;
        self.client_info = Some(params.client_info);
        self.protocol_version = Some(version.clone());

        Ok(InitializeResult::for_version(&version))
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
        tracing::debug!("MCP handshake complete");
    }
}
