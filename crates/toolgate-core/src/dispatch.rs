//! Session dispatcher: resolves, validates and executes tool calls.
//!
//! Every failure below the transport is captured here and converted into a
//! [`ToolOutcome`], so the transport always has something well-formed to
//! send back.

use crate::config::Limits;
use crate::error::{RegistryError, ToolError};
use crate::handler::{InvokeContext, ToolHandler};
use crate::progress::{null_progress, ProgressSink};
use crate::registry::ToolRegistry;
use crate::types::{ToolCallRequest, ToolOutcome};
use crate::validate::validate_arguments;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    limits: Limits,
    permits: Arc<Semaphore>,
    /// Cancellation tokens for calls currently in flight, keyed by
    /// correlation id. The only mutable dispatcher state.
    in_flight: Mutex<HashMap<String, CancellationToken>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, limits: Limits) -> Self {
        let permits = Arc::new(Semaphore::new(limits.max_concurrency));
        Self { registry, limits, permits, in_flight: Mutex::new(HashMap::new()) }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolOutcome {
        self.dispatch_with_progress(request, null_progress()).await
    }

    /// Dispatch a call, routing adapter progress events into `progress`.
    pub async fn dispatch_with_progress(
        &self,
        request: ToolCallRequest,
        progress: Arc<dyn ProgressSink>,
    ) -> ToolOutcome {
        let correlation_id = request.correlation_id.clone();
        let result = self.execute(request, progress).await;
        self.in_flight.lock().await.remove(&correlation_id);
        match result {
            Ok(value) => ToolOutcome::Success(value),
            Err(e) => ToolOutcome::Failure(e),
        }
    }

    /// Cancel an in-flight call by correlation id.
    ///
    /// Returns whether a call was found; cancelling an unknown or already
    /// completed id is a no-op.
    pub async fn cancel(&self, correlation_id: &str) -> bool {
        match self.in_flight.lock().await.get(correlation_id) {
            Some(token) => {
                debug!(correlation_id, "cancelling in-flight call");
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn execute(
        &self,
        request: ToolCallRequest,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<serde_json::Value, ToolError> {
        let handler = self.registry.resolve(&request.tool).map_err(|e| match e {
            RegistryError::Unknown(name) => ToolError::UnknownTool(name),
            RegistryError::Duplicate(name) => ToolError::Execution(format!(
                "registry inconsistency while resolving '{name}'"
            )),
        })?;

        let descriptor = handler.descriptor();
        let args = validate_arguments(&descriptor, &request.arguments)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ToolError::Execution("dispatcher is shutting down".into()))?;

        let cancel = CancellationToken::new();
        self.in_flight.lock().await.insert(request.correlation_id.clone(), cancel.clone());

        let ctx = InvokeContext::new().with_cancel(cancel.clone()).with_progress(progress);
        debug!(tool = %request.tool, execution_id = %ctx.execution_id, "invoking tool");

        // Spawn so a panicking handler is isolated from the session
        let task = tokio::spawn(async move { handler.invoke(args, ctx).await });

        match timeout(self.limits.call_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    warn!(tool = %request.tool, "tool handler panicked");
                    Err(ToolError::Execution("tool handler panicked".into()))
                } else {
                    Err(ToolError::Cancelled)
                }
            }
            Err(_) => {
                warn!(tool = %request.tool, timeout = ?self.limits.call_timeout, "tool call timed out");
                // Let the adapter release whatever it was holding
                cancel.cancel();
                Err(ToolError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ToolHandler;
    use crate::types::{ParamKind, ParamSpec, ToolDescriptor, ValidatedArgs};
    use async_trait::async_trait;
    use serde_json::{json, Map, Value as JsonValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingTool {
        invocations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ToolHandler for CountingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("count", "Counts invocations")
                .with_param("value", ParamSpec::required(ParamKind::String, "any value"))
        }

        async fn invoke(
            &self,
            args: ValidatedArgs,
            _ctx: InvokeContext,
        ) -> Result<JsonValue, ToolError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "echo": args.str_opt("value") }))
        }
    }

    /// Holds a "resource" until cancelled, recording that it released it
    struct BlockingTool {
        held: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ToolHandler for BlockingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("block", "Waits until cancelled")
        }

        async fn invoke(
            &self,
            _args: ValidatedArgs,
            ctx: InvokeContext,
        ) -> Result<JsonValue, ToolError> {
            self.held.fetch_add(1, Ordering::SeqCst);
            ctx.cancel.cancelled().await;
            self.released.fetch_add(1, Ordering::SeqCst);
            Err(ToolError::Cancelled)
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl ToolHandler for PanickingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("panic", "Panics")
        }

        async fn invoke(
            &self,
            _args: ValidatedArgs,
            _ctx: InvokeContext,
        ) -> Result<JsonValue, ToolError> {
            panic!("boom");
        }
    }

    fn dispatcher_with(handlers: Vec<Arc<dyn ToolHandler>>) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        for h in handlers {
            registry.register(h).unwrap();
        }
        Dispatcher::new(Arc::new(registry), Limits::default())
    }

    fn request(tool: &str, args: JsonValue, id: &str) -> ToolCallRequest {
        ToolCallRequest::new(tool, args.as_object().cloned().unwrap_or_else(Map::new), id)
    }

    #[tokio::test]
    async fn valid_call_invokes_handler_exactly_once() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let dispatcher =
            dispatcher_with(vec![Arc::new(CountingTool { invocations: invocations.clone() })]);

        let outcome = dispatcher.dispatch(request("count", json!({"value": "x"}), "r1")).await;
        assert!(outcome.is_success());
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_handler() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let dispatcher =
            dispatcher_with(vec![Arc::new(CountingTool { invocations: invocations.clone() })]);

        // missing required field
        let outcome = dispatcher.dispatch(request("count", json!({}), "r1")).await;
        assert!(matches!(outcome, ToolOutcome::Failure(ToolError::Validation { .. })));

        // unknown field
        let outcome = dispatcher
            .dispatch(request("count", json!({"value": "x", "extra": 1}), "r2"))
            .await;
        assert!(matches!(outcome, ToolOutcome::Failure(ToolError::Validation { .. })));

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_tool_fails_before_any_backend() {
        let dispatcher = dispatcher_with(vec![]);
        let outcome = dispatcher.dispatch(request("missing", json!({}), "r1")).await;
        assert!(
            matches!(outcome, ToolOutcome::Failure(ToolError::UnknownTool(ref n)) if n == "missing")
        );
    }

    #[tokio::test]
    async fn cancellation_releases_the_handler_and_reports_cancelled() {
        let held = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(dispatcher_with(vec![Arc::new(BlockingTool {
            held: held.clone(),
            released: released.clone(),
        })]));

        for i in 0..3 {
            let id = format!("c{i}");
            let d = dispatcher.clone();
            let call = {
                let id = id.clone();
                tokio::spawn(async move { d.dispatch(request("block", json!({}), &id)).await })
            };

            // Wait for the handler to be holding its resource
            while held.load(Ordering::SeqCst) <= i {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            assert!(dispatcher.cancel(&id).await);
            let outcome = call.await.unwrap();
            assert!(matches!(outcome, ToolOutcome::Failure(ToolError::Cancelled)));
        }

        // Every acquisition was matched by a release: nothing leaked
        assert_eq!(held.load(Ordering::SeqCst), 3);
        assert_eq!(released.load(Ordering::SeqCst), 3);

        // The id is gone once the call resolves
        assert!(!dispatcher.cancel("c0").await);
    }

    #[tokio::test]
    async fn panicking_handler_becomes_a_structured_failure() {
        let dispatcher = dispatcher_with(vec![Arc::new(PanickingTool)]);
        let outcome = dispatcher.dispatch(request("panic", json!({}), "r1")).await;
        assert!(matches!(outcome, ToolOutcome::Failure(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn slow_handler_times_out() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(BlockingTool {
                held: Arc::new(AtomicUsize::new(0)),
                released: Arc::new(AtomicUsize::new(0)),
            }))
            .unwrap();
        let limits =
            Limits { max_concurrency: 2, call_timeout: Duration::from_millis(50) };
        let dispatcher = Dispatcher::new(Arc::new(registry), limits);

        let outcome = dispatcher.dispatch(request("block", json!({}), "r1")).await;
        assert!(matches!(outcome, ToolOutcome::Failure(ToolError::Timeout)));
    }
}
