//! Argument validation against a tool's declared schema.
//!
//! Runs before any handler is invoked: type match per parameter kind,
//! required-field presence, and rejection of unknown fields. Failures name
//! the offending field.

use crate::error::ToolError;
use crate::types::{json_type_name, ToolDescriptor, ValidatedArgs};
use serde_json::{Map, Value as JsonValue};

pub fn validate_arguments(
    descriptor: &ToolDescriptor,
    arguments: &Map<String, JsonValue>,
) -> Result<ValidatedArgs, ToolError> {
    for (name, spec) in &descriptor.params {
        match arguments.get(name) {
            None | Some(JsonValue::Null) if spec.required => {
                return Err(ToolError::Validation {
                    field: name.clone(),
                    reason: "required argument is missing".into(),
                });
            }
            None | Some(JsonValue::Null) => {}
            Some(value) if !spec.kind.matches(value) => {
                return Err(ToolError::Validation {
                    field: name.clone(),
                    reason: format!(
                        "expected {}, got {}",
                        spec.kind.as_str(),
                        json_type_name(value)
                    ),
                });
            }
            Some(_) => {}
        }
    }

    if let Some(unknown) = arguments.keys().find(|k| !descriptor.params.contains_key(*k)) {
        return Err(ToolError::Validation {
            field: unknown.clone(),
            reason: "unknown argument".into(),
        });
    }

    Ok(ValidatedArgs::new(arguments.clone()))
}
