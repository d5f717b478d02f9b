use thiserror::Error;
use toolgate_connectors::ConnectorError;
use toolgate_core::ConfigError;
use toolgate_mcp::McpError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("backend setup failed: {0}")]
    Backend(#[from] ConnectorError),

    #[error("transport error: {0}")]
    Transport(#[from] McpError),
}

impl CliError {
    /// Configuration problems exit with a distinct code so wrappers can
    /// tell them from runtime failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Backend(
                ConnectorError::InvalidConfig(_) | ConnectorError::Connection(_),
            ) => 2,
            _ => 1,
        }
    }
}
