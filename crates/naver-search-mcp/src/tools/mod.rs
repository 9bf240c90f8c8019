//! MCP tool implementations.

pub mod datalab;
pub mod registry;
pub mod search;

pub use registry::{Dispatcher, ToolEntry, ToolGroup, ToolHandler, ToolRegistry};
