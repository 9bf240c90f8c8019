//! Session management for concurrent MCP clients.

pub mod manager;
pub mod state;

pub use manager::SessionManager;
pub use state::{CloseReason, Session, SessionEvent};
