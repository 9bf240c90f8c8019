//! Transport layer for MCP communication.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{router, HttpTransport, SESSION_ID_HEADER};
