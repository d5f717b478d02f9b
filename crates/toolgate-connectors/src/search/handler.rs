use super::{SearchClient, SearchConfig};
use crate::error::ConnectorResult;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use toolgate_core::{
    InvokeContext, ParamKind, ParamSpec, ToolDescriptor, ToolError, ToolHandler, ToolRegistry,
    ValidatedArgs,
};

/// The `search` tool: forwards a query to the configured search API.
pub struct SearchTool {
    client: SearchClient,
}

impl SearchTool {
    pub fn new(config: &SearchConfig) -> ConnectorResult<Self> {
        Ok(Self { client: SearchClient::new(config)? })
    }

    /// Construct the adapter and register its tool.
    pub fn register(registry: &mut ToolRegistry, config: &SearchConfig) -> ConnectorResult<()> {
        let tool = Arc::new(Self::new(config)?);
        registry
            .register(tool)
            .map_err(|e| crate::error::ConnectorError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ToolHandler for SearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("search", "Perform a web search against the configured search API")
            .with_param("query", ParamSpec::required(ParamKind::String, "The search query string"))
            .with_param(
                "max_results",
                ParamSpec::optional(ParamKind::Integer, "Maximum number of results to return"),
            )
    }

    async fn invoke(&self, args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        let query = args
            .str_opt("query")
            .ok_or_else(|| ToolError::Execution("validated 'query' argument missing".into()))?;
        let max_results = args.i64_opt("max_results");

        ctx.progress.report(0, Some(1));
        let results = self.client.search(query, max_results, &ctx.cancel).await?;
        ctx.progress.report(1, Some(1));

        Ok(json!({ "query": query, "results": results }))
    }
}
