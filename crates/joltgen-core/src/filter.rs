//! Drops transform operations that would do nothing.

use serde_json::Value;

use crate::operation::{Operation, TransformOperation};

/// Key under which generic dynamic fields are read in a shift spec.
pub const INPUT_KEY: &str = "input";

/// Whether `op` has no effect.
///
/// An operation is empty when its spec is absent, is `{}`, or (for `shift`)
/// consists solely of an empty `input` object.
pub fn is_empty_operation(op: &TransformOperation) -> bool {
    let spec = match &op.spec {
        Value::Null => return true,
        Value::Object(spec) => spec,
        _ => return false,
    };

    if spec.is_empty() {
        return true;
    }

    op.operation == Operation::Shift
        && spec.len() == 1
        && spec
            .get(INPUT_KEY)
            .and_then(Value::as_object)
            .is_some_and(|input| input.is_empty())
}

/// Remove empty operations, keeping the relative order of the rest.
///
/// Idempotent: filtering an already-filtered list returns it unchanged.
pub fn filter_empty_operations(ops: Vec<TransformOperation>) -> Vec<TransformOperation> {
    let before = ops.len();
    let kept: Vec<TransformOperation> = ops
        .into_iter()
        .filter(|op| !is_empty_operation(op))
        .collect();
    if kept.len() != before {
        tracing::debug!(removed = before - kept.len(), "filtered empty operations");
    }
    kept
}
