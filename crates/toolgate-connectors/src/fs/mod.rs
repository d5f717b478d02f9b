//! Filesystem adapter: file tools confined to a configured base path.

pub mod guard;
pub mod tools;

pub use guard::PathGuard;
pub use tools::{AnalyzeFolderTool, DeleteFileTool, ReadFileTool, WriteFileTool, MAX_FILE_SIZE};

use crate::error::{ConnectorError, ConnectorResult};
use std::path::PathBuf;
use std::sync::Arc;
use toolgate_core::config::{require, ConfigResult, EnvSource};
use toolgate_core::ToolRegistry;

/// Configuration for the filesystem backend
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub base_path: PathBuf,
}

impl FsConfig {
    pub const BASE_PATH_VAR: &'static str = "ALLOWED_BASE_PATH";

    pub fn from_env(env: &dyn EnvSource) -> ConfigResult<Self> {
        let base_path = PathBuf::from(require(env, Self::BASE_PATH_VAR)?);
        Ok(Self { base_path })
    }
}

/// Construct the confined adapter and register its tools.
pub fn register(registry: &mut ToolRegistry, config: &FsConfig) -> ConnectorResult<()> {
    let guard = Arc::new(PathGuard::new(&config.base_path)?);
    for tool in [
        Arc::new(ReadFileTool::new(guard.clone())) as Arc<dyn toolgate_core::ToolHandler>,
        Arc::new(WriteFileTool::new(guard.clone())),
        Arc::new(DeleteFileTool::new(guard.clone())),
        Arc::new(AnalyzeFolderTool::new(guard.clone())),
    ] {
        registry.register(tool).map_err(|e| ConnectorError::InvalidConfig(e.to_string()))?;
    }
    Ok(())
}
