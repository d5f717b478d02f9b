//! One client session over a persistent stream.
//!
//! Inbound frames are newline-delimited JSON-RPC messages. Each request is
//! handled on its own task and responses funnel through a single writer, so
//! multiple in-flight calls complete out of order without interleaving
//! corruption; every response carries the id of the request that caused it.
//! A malformed frame fails that one message, never the session.

use crate::jsonrpc::{
    error_response, success_response, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION,
};
use crate::protocol::{
    CallToolParams, CallToolResult, CancelledParams, ContentBlock, InitializeParams,
    InitializeResult, ListToolsResult, ProgressParams, ServerCapabilities, ServerInfo, ToolInfo,
    ToolsCapability, LATEST_PROTOCOL_VERSION, METHOD_INITIALIZE, METHOD_PING, METHOD_TOOLS_CALL,
    METHOD_TOOLS_LIST, NOTIFICATION_CANCELLED, NOTIFICATION_PROGRESS,
    SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::state::GatewayState;
use crate::McpResult;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use toolgate_core::{ProgressSink, ToolCallRequest, ToolError, ToolOutcome};
use tracing::{debug, error, warn};

const WRITE_QUEUE: usize = 64;

/// Drive one session until the peer closes the stream.
pub async fn run_session<R, W>(state: Arc<GatewayState>, reader: R, writer: W) -> McpResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(WRITE_QUEUE);

    // Single writer task: responses from concurrent calls are serialized
    // here, in completion order
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let frame = line.trim();
        if frame.is_empty() {
            continue;
        }

        // MCP does not support batch requests
        if frame.starts_with('[') {
            send(&tx, error_response(
                None,
                JsonRpcError::invalid_request()
                    .with_data(json!({"message": "Batch requests are not supported"})),
            ))
            .await;
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(frame) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                send(&tx, error_response(
                    None,
                    JsonRpcError::parse_error().with_data(json!({"message": e.to_string()})),
                ))
                .await;
                continue;
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            send(&tx, error_response(
                request.id,
                JsonRpcError::invalid_request()
                    .with_data(json!({"message": "Invalid JSON-RPC version"})),
            ))
            .await;
            continue;
        }

        if request.id.is_none() {
            handle_notification(&state, request).await;
            continue;
        }

        // Requests run concurrently; slow calls never block later frames
        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = handle_request(&state, request, &tx).await;
            send(&tx, response).await;
        });
    }

    drop(tx);
    let _ = writer_task.await;
    debug!("session closed");
    Ok(())
}

async fn send(tx: &mpsc::Sender<String>, response: JsonRpcResponse) {
    match serde_json::to_string(&response) {
        Ok(encoded) => {
            if tx.send(encoded).await.is_err() {
                debug!("session writer gone, dropping response");
            }
        }
        Err(e) => error!(error = %e, "failed to encode response"),
    }
}

async fn handle_notification(state: &Arc<GatewayState>, request: JsonRpcRequest) {
    let method = request.method.clone();
    match method.as_str() {
        NOTIFICATION_CANCELLED => {
            let params = request
                .params
                .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
            match params {
                Some(params) => {
                    let found = state.dispatcher.cancel(&params.request_id.key()).await;
                    debug!(found, "cancellation requested");
                }
                None => warn!("ignoring cancellation notification with invalid params"),
            }
        }
        other => debug!(method = other, "ignoring notification"),
    }
}

async fn handle_request(
    state: &Arc<GatewayState>,
    request: JsonRpcRequest,
    tx: &mpsc::Sender<String>,
) -> JsonRpcResponse {
    let method = request.method.clone();
    match method.as_str() {
        METHOD_INITIALIZE => handle_initialize(state, request),
        METHOD_PING => success_response(request.id, json!({})),
        METHOD_TOOLS_LIST => handle_tools_list(state, request),
        METHOD_TOOLS_CALL => handle_tools_call(state, request, tx).await,
        other => error_response(
            request.id,
            JsonRpcError::method_not_found().with_data(json!({"method": other})),
        ),
    }
}

fn handle_initialize(state: &Arc<GatewayState>, request: JsonRpcRequest) -> JsonRpcResponse {
    let requested_version = request
        .params
        .as_ref()
        .and_then(|p| serde_json::from_value::<InitializeParams>(p.clone()).ok())
        .map(|p| p.protocol_version);

    let protocol_version = match requested_version {
        Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()) => v,
        _ => LATEST_PROTOCOL_VERSION.to_string(),
    };

    let result = InitializeResult {
        protocol_version,
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
        },
        server_info: ServerInfo {
            name: state.server_name.clone(),
            version: state.server_version.clone(),
        },
        instructions: Some(
            "Toolgate gateway - search, filesystem and database tools".to_string(),
        ),
    };

    match serde_json::to_value(result) {
        Ok(value) => success_response(request.id, value),
        Err(e) => error_response(
            request.id,
            JsonRpcError::internal_error().with_data(json!({"message": e.to_string()})),
        ),
    }
}

fn handle_tools_list(state: &Arc<GatewayState>, request: JsonRpcRequest) -> JsonRpcResponse {
    let tools = state
        .registry
        .descriptors()
        .into_iter()
        .map(|d| ToolInfo {
            input_schema: d.input_schema(),
            description: Some(d.description),
            name: d.name,
        })
        .collect();

    let result = ListToolsResult { tools, next_cursor: None };
    match serde_json::to_value(result) {
        Ok(value) => success_response(request.id, value),
        Err(e) => error_response(
            request.id,
            JsonRpcError::internal_error().with_data(json!({"message": e.to_string()})),
        ),
    }
}

async fn handle_tools_call(
    state: &Arc<GatewayState>,
    request: JsonRpcRequest,
    tx: &mpsc::Sender<String>,
) -> JsonRpcResponse {
    let id = request.id;

    let params = match request.params {
        Some(params) => params,
        None => {
            return error_response(
                id,
                JsonRpcError::invalid_params()
                    .with_data(json!({"message": "Missing params for tools/call"})),
            )
        }
    };

    let call: CallToolParams = match serde_json::from_value(params) {
        Ok(call) => call,
        Err(e) => {
            return error_response(
                id,
                JsonRpcError::invalid_params().with_data(json!({"message": e.to_string()})),
            )
        }
    };

    let arguments: Map<String, Value> = match call.arguments {
        None => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return error_response(
                id,
                JsonRpcError::invalid_params()
                    .with_data(json!({"message": "Arguments must be an object"})),
            )
        }
    };

    let correlation_id = id.as_ref().map(|i| i.key()).unwrap_or_default();
    let tool_call = ToolCallRequest::new(call.name, arguments, correlation_id);

    // Progress events flow back as notifications when the caller supplied
    // a progress token
    let progress: Arc<dyn ProgressSink> = match call.meta.and_then(|m| m.progress_token) {
        Some(token) => Arc::new(NotificationProgress { token, tx: tx.clone() }),
        None => toolgate_core::null_progress(),
    };

    let outcome = state.dispatcher.dispatch_with_progress(tool_call, progress).await;

    match outcome {
        ToolOutcome::Success(payload) => {
            let text = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
            let result = CallToolResult {
                content: vec![ContentBlock::Text { text }],
                is_error: None,
                structured_content: Some(payload),
            };
            match serde_json::to_value(result) {
                Ok(value) => success_response(id, value),
                Err(e) => error_response(
                    id,
                    JsonRpcError::internal_error().with_data(json!({"message": e.to_string()})),
                ),
            }
        }
        ToolOutcome::Failure(err) => error_response(id, tool_error_to_rpc(&err)),
    }
}

fn tool_error_to_rpc(err: &ToolError) -> JsonRpcError {
    let rpc = match err {
        ToolError::Validation { .. } => JsonRpcError::invalid_params(),
        ToolError::UnknownTool(_) => JsonRpcError::method_not_found(),
        _ => JsonRpcError::internal_error(),
    };
    rpc.with_data(err.data())
}

/// Emits `notifications/progress` frames through the session writer
struct NotificationProgress {
    token: Value,
    tx: mpsc::Sender<String>,
}

impl ProgressSink for NotificationProgress {
    fn report(&self, progress: u64, total: Option<u64>) {
        let params = ProgressParams { progress_token: self.token.clone(), progress, total };
        let notification = match serde_json::to_value(params) {
            Ok(params) => JsonRpcRequest::notification(NOTIFICATION_PROGRESS, params),
            Err(_) => return,
        };
        if let Ok(encoded) = serde_json::to_string(&notification) {
            // Progress is advisory; drop events rather than block the call
            let _ = self.tx.try_send(encoded);
        }
    }
}
