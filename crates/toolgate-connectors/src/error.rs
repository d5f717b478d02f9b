use toolgate_core::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "search")]
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Upstream timed out after {0}ms")]
    Timeout(u64),

    #[error("Upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Path not allowed: {0}")]
    PathNotAllowed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Cancelled")]
    Cancelled,
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Map adapter failures onto the gateway taxonomy; raw client-library
/// errors never cross this boundary.
impl From<ConnectorError> for ToolError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::Timeout(elapsed_ms) => ToolError::UpstreamTimeout { elapsed_ms },
            ConnectorError::UpstreamStatus { status, message } => {
                ToolError::Upstream { status: Some(status), message }
            }
            #[cfg(feature = "search")]
            ConnectorError::Http(e) => ToolError::Upstream {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            ConnectorError::PathNotAllowed(path) => ToolError::PathNotAllowed(path),
            ConnectorError::Validation(reason) => {
                ToolError::Validation { field: "arguments".into(), reason }
            }
            ConnectorError::Cancelled => ToolError::Cancelled,
            #[cfg(feature = "postgres")]
            ConnectorError::Database(e) => ToolError::Execution(format!("database error: {e}")),
            ConnectorError::Io(e) => ToolError::Execution(format!("io error: {e}")),
            ConnectorError::Serialization(e) => {
                ToolError::Execution(format!("serialization error: {e}"))
            }
            ConnectorError::InvalidConfig(msg)
            | ConnectorError::Connection(msg)
            | ConnectorError::ExecutionFailed(msg) => ToolError::Execution(msg),
        }
    }
}
