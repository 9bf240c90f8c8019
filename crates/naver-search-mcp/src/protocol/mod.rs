//! MCP protocol handling: JSON-RPC interpretation for a single session.

pub mod engine;
pub mod negotiation;
pub mod validator;

pub use engine::{EngineState, ProtocolEngine};
