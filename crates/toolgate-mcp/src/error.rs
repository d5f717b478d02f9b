//! Transport-level errors.
//!
//! Everything inside a tool call is converted to structured results before
//! it reaches this layer; only session I/O and serving failures surface
//! here.

use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
