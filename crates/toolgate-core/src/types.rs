//! Core data model: tool descriptors, call requests and outcomes

use crate::error::ToolError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// Declared type of a single tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        }
    }

    /// Whether a JSON value satisfies this kind
    pub fn matches(&self, value: &JsonValue) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }
}

/// Human-readable name for a JSON value's type, used in validation messages
pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Specification of a single named parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn required(kind: ParamKind, description: impl Into<String>) -> Self {
        Self { kind, required: true, description: description.into() }
    }

    pub fn optional(kind: ParamKind, description: impl Into<String>) -> Self {
        Self { kind, required: false, description: description.into() }
    }
}

/// Immutable description of a registered tool.
///
/// Created when an adapter registers at startup; parameters keep their
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: IndexMap<String, ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), params: IndexMap::new() }
    }

    pub fn with_param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.params.insert(name.into(), spec);
        self
    }

    /// JSON-Schema-shaped rendering of the parameter set, as advertised to
    /// clients in `tools/list`.
    pub fn input_schema(&self) -> JsonValue {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, spec) in &self.params {
            properties.insert(
                name.clone(),
                json!({ "type": spec.kind.as_str(), "description": spec.description }),
            );
            if spec.required {
                required.push(JsonValue::String(name.clone()));
            }
        }
        let mut schema = json!({ "type": "object", "properties": properties });
        if !required.is_empty() {
            schema["required"] = JsonValue::Array(required);
        }
        schema
    }
}

/// A single inbound tool call, owned by the dispatcher while in flight
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub tool: String,
    pub arguments: Map<String, JsonValue>,
    /// Opaque token linking this request to its eventual response
    pub correlation_id: String,
}

impl ToolCallRequest {
    pub fn new(
        tool: impl Into<String>,
        arguments: Map<String, JsonValue>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self { tool: tool.into(), arguments, correlation_id: correlation_id.into() }
    }
}

/// Arguments that passed schema validation
#[derive(Debug, Clone)]
pub struct ValidatedArgs {
    values: Map<String, JsonValue>,
}

impl ValidatedArgs {
    pub(crate) fn new(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn str_opt(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(JsonValue::as_str)
    }

    pub fn i64_opt(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(JsonValue::as_i64)
    }

    pub fn array_opt(&self, name: &str) -> Option<&Vec<JsonValue>> {
        self.values.get(name).and_then(JsonValue::as_array)
    }

    /// Deserialize the full argument map into a typed parameter struct.
    ///
    /// Validation has already checked types and presence, so a mismatch here
    /// indicates a handler/descriptor disagreement, not caller error.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(JsonValue::Object(self.values.clone()))
            .map_err(|e| ToolError::Execution(format!("argument decoding failed: {e}")))
    }

    pub fn into_inner(self) -> Map<String, JsonValue> {
        self.values
    }
}

/// Terminal outcome of a tool call: exactly one of success or failure
#[derive(Debug)]
pub enum ToolOutcome {
    Success(JsonValue),
    Failure(ToolError),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }
}
