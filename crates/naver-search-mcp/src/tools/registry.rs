//! Tool registration and dispatch.
//!
//! Tools are contributed in groups. [`Dispatcher::from_groups`] merges them
//! once at startup and refuses duplicate names, so every advertised tool has
//! exactly one handler and every handler is advertised.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use naver_search::NaverClient;

use crate::types::{McpError, McpResult, ToolDefinition};

use super::{datalab, search};

/// A single executable tool. Implementations hold no per-call state and are
/// shared by every session.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> McpResult<Value>;
}

/// A tool definition paired with its handler.
pub struct ToolEntry {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolEntry {
    pub fn new(definition: ToolDefinition, handler: impl ToolHandler + 'static) -> Self {
        Self {
            definition,
            handler: Arc::new(handler),
        }
    }
}

/// An independently defined set of tools, e.g. "search" or "datalab".
pub struct ToolGroup {
    name: String,
    entries: Vec<ToolEntry>,
}

impl ToolGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, entry: ToolEntry) -> Self {
        self.entries.push(entry);
        self
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Ordered, immutable list of advertised tools.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Definitions of the built-in tools, in registration order. Needs no credentials.
    pub fn builtin() -> Self {
        let mut tools = search::definitions();
        tools.extend(datalab::definitions());
        Self { tools }
    }

    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Name → handler table shared read-only by all protocol engines.
pub struct Dispatcher {
    registry: ToolRegistry,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl Dispatcher {
    /// Merge tool groups, failing on the first duplicate name.
    pub fn from_groups(groups: impl IntoIterator<Item = ToolGroup>) -> McpResult<Self> {
        let mut tools = Vec::new();
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();

        for group in groups {
            tracing::debug!("Registering tool group {} ({} tools)", group.name, group.len());
            for entry in group.entries {
                let name = entry.definition.name.clone();
                if handlers.contains_key(&name) {
                    return Err(McpError::DuplicateTool {
                        name,
                        group: group.name,
                    });
                }
                handlers.insert(name, entry.handler);
                tools.push(entry.definition);
            }
        }

        Ok(Self {
            registry: ToolRegistry { tools },
            handlers,
        })
    }

    /// The production dispatcher: search tools followed by DataLab tools.
    pub fn naver(client: Arc<NaverClient>) -> McpResult<Self> {
        Self::from_groups([search::group(client.clone()), datalab::group(client)])
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run a tool on its own task so a panicking handler cannot take the
    /// caller down. If the caller goes away, the task still runs to completion
    /// and its result is dropped.
    pub async fn call(&self, name: &str, args: Value) -> McpResult<Value> {
        let handler = self
            .handlers
            .get(name)
            .cloned()
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;

        match tokio::spawn(async move { handler.call(args).await }).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Tool {name} aborted: {e}");
                Err(McpError::ToolPanicked(name.to_string()))
            }
        }
    }
}

/// Deserialize tool arguments, reporting schema mismatches as invalid params.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))
}
