//! Transform operations as consumed by the external JOLT engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GenerateError;

/// JOLT operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Shift,
    Default,
    ModifyOverwriteBeta,
    Remove,
}

/// One `{operation, spec}` step of a transform specification.
///
/// `spec` is `Value::Null` when the step carried no spec at all; such steps
/// are always filtered out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOperation {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
}

impl TransformOperation {
    pub fn new(operation: Operation, spec: Map<String, Value>) -> Self {
        Self {
            operation,
            spec: Value::Object(spec),
        }
    }

    pub fn shift(spec: Map<String, Value>) -> Self {
        Self::new(Operation::Shift, spec)
    }

    pub fn default_values(spec: Map<String, Value>) -> Self {
        Self::new(Operation::Default, spec)
    }

    pub fn modify_overwrite(spec: Map<String, Value>) -> Self {
        Self::new(Operation::ModifyOverwriteBeta, spec)
    }

    pub fn remove(spec: Map<String, Value>) -> Self {
        Self::new(Operation::Remove, spec)
    }

    /// The spec as an object, if it is one.
    pub fn spec_object(&self) -> Option<&Map<String, Value>> {
        self.spec.as_object()
    }
}

/// Decode an operation list, reporting the offending element by index.
pub fn parse_operations(value: Value) -> Result<Vec<TransformOperation>, GenerateError> {
    let Value::Array(items) = value else {
        return Err(GenerateError::InvalidOperation {
            index: 0,
            message: "expected an array of operations".to_string(),
        });
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| GenerateError::InvalidOperation {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
