use serde_json::{json, Value as JsonValue};
use thiserror::Error;

/// Failures a tool call can resolve to.
///
/// Every variant maps to a stable wire `kind` string so clients can decide
/// whether to retry without parsing messages.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid argument '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("path not allowed: {0}")]
    PathNotAllowed(String),

    #[error("upstream timed out after {elapsed_ms}ms")]
    UpstreamTimeout { elapsed_ms: u64 },

    #[error("upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("tool call timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,
}

impl ToolError {
    /// Stable identifier carried in wire error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation { .. } => "Validation",
            ToolError::UnknownTool(_) => "UnknownTool",
            ToolError::PathNotAllowed(_) => "PathNotAllowed",
            ToolError::UpstreamTimeout { .. } => "UpstreamTimeout",
            ToolError::Upstream { .. } => "Upstream",
            ToolError::Execution(_) => "Execution",
            ToolError::Timeout => "Timeout",
            ToolError::Cancelled => "Cancelled",
        }
    }

    /// Structured payload for wire error objects
    pub fn data(&self) -> JsonValue {
        let mut data = json!({ "kind": self.kind(), "message": self.to_string() });
        match self {
            ToolError::Validation { field, .. } => {
                data["field"] = json!(field);
            }
            ToolError::Upstream { status: Some(status), .. } => {
                data["status"] = json!(status);
            }
            _ => {}
        }
        data
    }
}

/// Registry-level failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    Duplicate(String),

    #[error("unknown tool: {0}")]
    Unknown(String),
}
