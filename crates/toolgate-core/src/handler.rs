//! The capability interface every backend adapter implements

use crate::error::ToolError;
use crate::progress::{null_progress, ProgressSink};
use crate::types::{ToolDescriptor, ValidatedArgs};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-call context handed to a handler: cancellation and progress.
#[derive(Clone)]
pub struct InvokeContext {
    /// Unique id for tracing this execution
    pub execution_id: String,
    /// Cancelled when the client cancels the originating request or the
    /// call exceeds its budget; handlers must release partially acquired
    /// resources and return [`ToolError::Cancelled`] promptly.
    pub cancel: CancellationToken,
    pub progress: Arc<dyn ProgressSink>,
}

impl InvokeContext {
    pub fn new() -> Self {
        Self {
            execution_id: uuid::Uuid::new_v4().to_string(),
            cancel: CancellationToken::new(),
            progress: null_progress(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }
}

impl Default for InvokeContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, schema-described operation backed by one adapter.
///
/// `invoke` only ever sees arguments that satisfied the descriptor's schema.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn invoke(&self, args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError>;
}

impl std::fmt::Debug for dyn ToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandler").field("name", &self.descriptor().name).finish()
    }
}
