//! File tools confined to the allowed base path.
//!
//! Blocking filesystem work runs under `spawn_blocking`; long directory
//! walks report progress incrementally and honour cancellation between
//! items.

use super::guard::PathGuard;
use crate::error::{ConnectorError, ConnectorResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_core::{
    InvokeContext, ParamKind, ParamSpec, ProgressSink, ToolDescriptor, ToolError, ToolHandler,
    ValidatedArgs,
};
use walkdir::WalkDir;

/// Per-file size cap for read and write operations
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Directory listings are truncated to this many entries in the payload;
/// counts and sizes still cover everything walked.
const MAX_LISTED_FILES: usize = 50;

const READ_CHUNK: usize = 64 * 1024;
const PROGRESS_EVERY: u64 = 10;

fn path_arg(args: &ValidatedArgs) -> Result<String, ToolError> {
    args.str_opt("path")
        .map(str::to_string)
        .ok_or_else(|| ToolError::Execution("validated 'path' argument missing".into()))
}

async fn run_blocking<T, F>(op: F) -> ConnectorResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ConnectorResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ConnectorError::ExecutionFailed(format!("blocking task failed: {e}")))?
}

/// `read_file`: return the content of a file inside the allowed base.
pub struct ReadFileTool {
    guard: Arc<PathGuard>,
}

impl ReadFileTool {
    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for ReadFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("read_file", "Read content from a file in the allowed folder")
            .with_param("path", ParamSpec::required(ParamKind::String, "Relative path to the file"))
    }

    async fn invoke(&self, args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        let path = path_arg(&args)?;
        // Confinement check happens before any operation on the target
        let resolved = self.guard.resolve_existing(&path)?;
        let cancel = ctx.cancel.clone();
        let progress = ctx.progress.clone();

        let (content, size) = run_blocking(move || read_confined(&resolved, &cancel, &*progress)).await?;
        Ok(json!({ "path": path, "size": size, "content": content }))
    }
}

fn read_confined(
    resolved: &Path,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> ConnectorResult<(String, u64)> {
    let metadata = fs::metadata(resolved)?;
    if !metadata.is_file() {
        return Err(ConnectorError::ExecutionFailed(format!(
            "not a file: {}",
            resolved.display()
        )));
    }
    if metadata.len() > MAX_FILE_SIZE {
        return Err(ConnectorError::ExecutionFailed(format!(
            "file too large: {} bytes (limit {MAX_FILE_SIZE})",
            metadata.len()
        )));
    }

    // Chunked read so an in-progress read can be abandoned on cancellation
    let total = metadata.len();
    let mut file = fs::File::open(resolved)?;
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        if cancel.is_cancelled() {
            return Err(ConnectorError::Cancelled);
        }
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress.report(bytes.len() as u64, Some(total));
    }

    let content = String::from_utf8(bytes)
        .map_err(|_| ConnectorError::ExecutionFailed("file is not valid UTF-8".into()))?;
    Ok((content, total))
}

/// `write_file`: write content to a file inside the allowed base,
/// creating parent directories as needed.
pub struct WriteFileTool {
    guard: Arc<PathGuard>,
}

impl WriteFileTool {
    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for WriteFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("write_file", "Write content to a file in the allowed folder")
            .with_param("path", ParamSpec::required(ParamKind::String, "Relative path to the file"))
            .with_param("content", ParamSpec::required(ParamKind::String, "Content to write"))
    }

    async fn invoke(&self, args: ValidatedArgs, _ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        #[derive(Deserialize)]
        struct WriteParams {
            path: String,
            content: String,
        }

        let WriteParams { path, content } = args.parse()?;
        if content.len() as u64 > MAX_FILE_SIZE {
            return Err(ConnectorError::ExecutionFailed(format!(
                "content too large: {} bytes (limit {MAX_FILE_SIZE})",
                content.len()
            ))
            .into());
        }

        let resolved = self.guard.resolve_for_write(&path)?;
        let written = run_blocking(move || {
            if let Some(parent) = resolved.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&resolved, content.as_bytes())?;
            Ok(content.len() as u64)
        })
        .await?;

        Ok(json!({ "path": path, "bytes_written": written }))
    }
}

/// `delete_file`: remove a file inside the allowed base.
pub struct DeleteFileTool {
    guard: Arc<PathGuard>,
}

impl DeleteFileTool {
    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for DeleteFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("delete_file", "Delete a file in the allowed folder")
            .with_param("path", ParamSpec::required(ParamKind::String, "Relative path to the file"))
    }

    async fn invoke(&self, args: ValidatedArgs, _ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        let path = path_arg(&args)?;
        let resolved = self.guard.resolve_existing(&path)?;

        run_blocking(move || {
            if !resolved.is_file() {
                return Err(ConnectorError::ExecutionFailed(format!(
                    "not a file: {}",
                    resolved.display()
                )));
            }
            fs::remove_file(&resolved)?;
            Ok(())
        })
        .await?;

        Ok(json!({ "path": path, "deleted": true }))
    }
}

/// `analyze_folder`: walk a directory inside the allowed base, reporting
/// progress as items are processed.
pub struct AnalyzeFolderTool {
    guard: Arc<PathGuard>,
}

impl AnalyzeFolderTool {
    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl ToolHandler for AnalyzeFolderTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "analyze_folder",
            "Analyze a folder in the allowed base: file count, total size and entries",
        )
        .with_param("path", ParamSpec::required(ParamKind::String, "Relative path to the folder"))
    }

    async fn invoke(&self, args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        let path = path_arg(&args)?;
        let resolved = self.guard.resolve_existing(&path)?;
        let base = self.guard.base().to_path_buf();
        let cancel = ctx.cancel.clone();
        let progress = ctx.progress.clone();

        let analysis =
            run_blocking(move || walk_folder(&resolved, &base, &cancel, &*progress)).await?;
        let mut payload = analysis;
        payload["path"] = json!(path);
        Ok(payload)
    }
}

fn walk_folder(
    resolved: &Path,
    base: &Path,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> ConnectorResult<JsonValue> {
    if !resolved.is_dir() {
        return Err(ConnectorError::ExecutionFailed(format!(
            "not a directory: {}",
            resolved.display()
        )));
    }

    let mut files = Vec::new();
    let mut file_count: u64 = 0;
    let mut total_size: u64 = 0;

    for entry in WalkDir::new(resolved).follow_links(false) {
        if cancel.is_cancelled() {
            return Err(ConnectorError::Cancelled);
        }
        let entry = entry.map_err(|e| ConnectorError::ExecutionFailed(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| ConnectorError::ExecutionFailed(e.to_string()))?;
        file_count += 1;
        total_size += metadata.len();

        if files.len() < MAX_LISTED_FILES {
            let rel = entry.path().strip_prefix(base).unwrap_or(entry.path());
            let modified = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            files.push(json!({
                "name": entry.file_name().to_string_lossy(),
                "path": rel.to_string_lossy(),
                "size": metadata.len(),
                "modified": modified,
            }));
        }

        if file_count % PROGRESS_EVERY == 0 {
            progress.report(file_count, None);
        }
    }

    progress.report(file_count, Some(file_count));

    Ok(json!({
        "file_count": file_count,
        "total_size": total_size,
        "files": files,
    }))
}
