//! Toolgate MCP transport.
//!
//! Frames tool calls as newline-delimited JSON-RPC 2.0 over a persistent
//! stream (stdio or TCP), dispatches them through the core gateway, and
//! writes correlated responses back as calls complete.

pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod server;
pub mod session;
pub mod state;

pub use error::{McpError, McpResult};
pub use server::{serve_stdio, serve_tcp};
pub use session::run_session;
pub use state::GatewayState;
