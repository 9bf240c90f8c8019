//! Naver Search MCP Server: Naver search and DataLab analytics for LLM clients
//! over streamable HTTP, one isolated protocol engine per session.

pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use protocol::ProtocolEngine;
pub use session::{CloseReason, Session, SessionEvent, SessionManager};
pub use tools::{Dispatcher, ToolRegistry};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
