//! Session-level behavior over an in-memory stream: correlation,
//! out-of-order completion, cancellation, progress and malformed frames.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use toolgate_core::{
    InvokeContext, Limits, ParamKind, ParamSpec, ToolDescriptor, ToolError, ToolHandler,
    ToolRegistry, ValidatedArgs,
};
use toolgate_mcp::{run_session, GatewayState};

/// Returns a fixed payload, optionally after a delay
struct StubTool {
    name: &'static str,
    payload: Value,
    delay: Duration,
}

#[async_trait]
impl ToolHandler for StubTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name, "Stub tool")
            .with_param("query", ParamSpec::optional(ParamKind::String, "query"))
    }

    async fn invoke(&self, _args: ValidatedArgs, ctx: InvokeContext) -> Result<Value, ToolError> {
        if !self.delay.is_zero() {
            tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(ToolError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        Ok(self.payload.clone())
    }
}

/// Waits until cancelled
struct WaitTool;

#[async_trait]
impl ToolHandler for WaitTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("wait", "Waits for cancellation")
    }

    async fn invoke(&self, _args: ValidatedArgs, ctx: InvokeContext) -> Result<Value, ToolError> {
        ctx.cancel.cancelled().await;
        Err(ToolError::Cancelled)
    }
}

/// Reports progress in steps, then completes
struct SteppingTool;

#[async_trait]
impl ToolHandler for SteppingTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("steps", "Reports progress")
    }

    async fn invoke(&self, _args: ValidatedArgs, ctx: InvokeContext) -> Result<Value, ToolError> {
        for step in 1..=3u64 {
            ctx.progress.report(step, Some(3));
        }
        Ok(json!({"done": true}))
    }
}

struct Harness {
    writer: tokio::io::WriteHalf<tokio::io::DuplexStream>,
    reader: BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>,
}

impl Harness {
    fn start() -> Self {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(StubTool {
                name: "search",
                payload: json!(["r1", "r2"]),
                delay: Duration::ZERO,
            }))
            .unwrap();
        registry
            .register(Arc::new(StubTool {
                name: "slow",
                payload: json!("slow done"),
                delay: Duration::from_millis(300),
            }))
            .unwrap();
        registry.register(Arc::new(WaitTool)).unwrap();
        registry.register(Arc::new(SteppingTool)).unwrap();

        let state = Arc::new(GatewayState::new(registry, Limits::default()));

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        tokio::spawn(async move {
            let _ = run_session(state, server_read, server_write).await;
        });

        let (client_read, client_write) = tokio::io::split(client);
        Self { writer: client_write, reader: BufReader::new(client_read) }
    }

    async fn send_raw(&mut self, frame: &str) {
        self.writer.write_all(frame.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn send(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await;
    }

    async fn recv(&mut self) -> Value {
        let mut line = String::new();
        let read = tokio::time::timeout(
            Duration::from_secs(5),
            self.reader.read_line(&mut line),
        )
        .await
        .expect("timed out waiting for frame")
        .unwrap();
        assert!(read > 0, "session closed unexpectedly");
        serde_json::from_str(line.trim()).unwrap()
    }

    /// Read frames until the response with the given id arrives,
    /// collecting any notifications seen on the way.
    async fn recv_response(&mut self, id: &Value) -> (Value, Vec<Value>) {
        let mut notifications = Vec::new();
        loop {
            let frame = self.recv().await;
            if frame.get("id") == Some(id) {
                return (frame, notifications);
            }
            notifications.push(frame);
        }
    }

    fn call(id: Value, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        })
    }
}

#[tokio::test]
async fn search_call_round_trips_with_its_id() {
    let mut h = Harness::start();

    h.send(Harness::call(json!("abc"), "search", json!({"query": "test"}))).await;
    let (response, _) = h.recv_response(&json!("abc")).await;

    assert_eq!(response["id"], "abc");
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["structuredContent"], json!(["r1", "r2"]));
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": 1, "method": "initialize",
        "params": {"protocolVersion": "2025-06-18"}
    }))
    .await;
    let (response, _) = h.recv_response(&json!(1)).await;
    assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(response["result"]["serverInfo"]["name"], "toolgate");

    h.send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let (response, _) = h.recv_response(&json!(2)).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"search"));
    assert!(names.contains(&"wait"));
    // Schemas are advertised alongside names
    let search = tools.iter().find(|t| t["name"] == "search").unwrap();
    assert_eq!(search["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn responses_complete_out_of_order_keyed_by_id() {
    let mut h = Harness::start();

    h.send(Harness::call(json!(1), "slow", json!({}))).await;
    h.send(Harness::call(json!(2), "search", json!({}))).await;

    // The fast call finishes first even though it was issued second
    let first = h.recv().await;
    assert_eq!(first["id"], 2);
    let second = h.recv().await;
    assert_eq!(second["id"], 1);
    assert_eq!(second["result"]["structuredContent"], "slow done");
}

#[tokio::test]
async fn malformed_frame_fails_the_message_not_the_session() {
    let mut h = Harness::start();

    h.send_raw("{this is not json").await;
    let error = h.recv().await;
    assert_eq!(error["error"]["code"], -32700);

    // Session still alive
    h.send(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})).await;
    let (response, _) = h.recv_response(&json!(7)).await;
    assert_eq!(response["result"], json!({}));
}

#[tokio::test]
async fn batch_frames_are_rejected() {
    let mut h = Harness::start();

    h.send_raw(r#"[{"jsonrpc": "2.0", "id": 1, "method": "ping"}]"#).await;
    let error = h.recv().await;
    assert_eq!(error["error"]["code"], -32600);
}

#[tokio::test]
async fn cancellation_by_correlation_id_yields_cancelled() {
    let mut h = Harness::start();

    h.send(Harness::call(json!(9), "wait", json!({}))).await;
    // Give the call a moment to become in-flight before cancelling
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.send(json!({
        "jsonrpc": "2.0", "method": "notifications/cancelled",
        "params": {"requestId": 9}
    }))
    .await;

    let (response, _) = h.recv_response(&json!(9)).await;
    assert_eq!(response["error"]["data"]["kind"], "Cancelled");
}

#[tokio::test]
async fn unknown_tool_fails_cleanly() {
    let mut h = Harness::start();

    h.send(Harness::call(json!(3), "nope", json!({}))).await;
    let (response, _) = h.recv_response(&json!(3)).await;
    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["data"]["kind"], "UnknownTool");
}

#[tokio::test]
async fn validation_failures_report_the_field() {
    let mut h = Harness::start();

    h.send(Harness::call(json!(4), "search", json!({"query": 12}))).await;
    let (response, _) = h.recv_response(&json!(4)).await;
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["data"]["kind"], "Validation");
    assert_eq!(response["error"]["data"]["field"], "query");
}

#[tokio::test]
async fn progress_notifications_precede_the_response() {
    let mut h = Harness::start();

    h.send(json!({
        "jsonrpc": "2.0", "id": 5, "method": "tools/call",
        "params": {
            "name": "steps",
            "arguments": {},
            "_meta": {"progressToken": "p1"}
        }
    }))
    .await;

    let (response, notifications) = h.recv_response(&json!(5)).await;
    assert_eq!(response["result"]["structuredContent"]["done"], true);

    let progress: Vec<_> = notifications
        .iter()
        .filter(|n| n["method"] == "notifications/progress")
        .collect();
    assert_eq!(progress.len(), 3);
    assert_eq!(progress[0]["params"]["progressToken"], "p1");
    assert_eq!(progress[2]["params"]["progress"], 3);
    assert_eq!(progress[2]["params"]["total"], 3);
}
