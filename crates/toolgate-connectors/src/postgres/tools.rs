//! Query tools exposed over the pooled PostgreSQL executor.

use super::PostgresExecutor;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use toolgate_core::{
    InvokeContext, ParamKind, ParamSpec, ToolDescriptor, ToolError, ToolHandler, ValidatedArgs,
};

const LIST_TABLES_SQL: &str = "\
SELECT table_name
FROM information_schema.tables
WHERE table_schema = 'public'
ORDER BY table_name";

const DESCRIBE_TABLE_SQL: &str = "\
SELECT column_name, data_type, is_nullable, column_default
FROM information_schema.columns
WHERE table_schema = 'public' AND table_name = $1
ORDER BY ordinal_position";

/// `execute_query`: run an arbitrary parameterized statement.
pub struct ExecuteQueryTool {
    executor: Arc<PostgresExecutor>,
}

impl ExecuteQueryTool {
    pub fn new(executor: Arc<PostgresExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for ExecuteQueryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "execute_query",
            "Execute a parameterized SQL statement on the configured database",
        )
        .with_param("statement", ParamSpec::required(ParamKind::String, "The SQL statement; use $1, $2, ... placeholders"))
        .with_param("params", ParamSpec::optional(ParamKind::Array, "Positional values bound to the placeholders"))
    }

    async fn invoke(&self, args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        let statement = args
            .str_opt("statement")
            .ok_or_else(|| ToolError::Execution("validated 'statement' argument missing".into()))?;
        let params = args.array_opt("params").cloned().unwrap_or_default();

        Ok(self.executor.execute(statement, &params, &ctx.cancel).await?)
    }
}

/// `list_tables`: list all tables in the public schema.
pub struct ListTablesTool {
    executor: Arc<PostgresExecutor>,
}

impl ListTablesTool {
    pub fn new(executor: Arc<PostgresExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for ListTablesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("list_tables", "List all tables in the connected database")
    }

    async fn invoke(&self, _args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        Ok(self.executor.execute(LIST_TABLES_SQL, &[], &ctx.cancel).await?)
    }
}

/// `describe_table`: column structure of one table.
pub struct DescribeTableTool {
    executor: Arc<PostgresExecutor>,
}

impl DescribeTableTool {
    pub fn new(executor: Arc<PostgresExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for DescribeTableTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("describe_table", "Describe the structure of a specific table")
            .with_param(
                "table_name",
                ParamSpec::required(ParamKind::String, "Name of the table to describe"),
            )
    }

    async fn invoke(&self, args: ValidatedArgs, ctx: InvokeContext) -> Result<JsonValue, ToolError> {
        let table_name = args
            .str_opt("table_name")
            .ok_or_else(|| ToolError::Execution("validated 'table_name' argument missing".into()))?;

        // The table name travels as a bind value, exactly like user data
        let params = vec![JsonValue::String(table_name.to_string())];
        Ok(self.executor.execute(DESCRIBE_TABLE_SQL, &params, &ctx.cancel).await?)
    }
}
