//! Response-side specifications and the auto-default rule.
//!
//! A response spec moves fields of an upstream API response into session
//! variables (`shift`), then guarantees every declared variable exists
//! (`default`) even when the upstream omits it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::GenerateOptions;
use crate::error::GenerateError;
use crate::filter::{filter_empty_operations, INPUT_KEY};
use crate::operation::{Operation, TransformOperation};
use crate::path::{set_nested_value, write_would_replace};

/// Suffix stripped from a menu session variable to get its base name.
pub const ITEMS_SUFFIX: &str = "_items";
/// Value key meaning "route by position", which needs no extraction.
pub const INDEX_VALUE_KEY: &str = "index";

const DEFAULT_ERROR_CODE: &str = "UNKNOWN_ERROR";
const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Declared mapping from an upstream response into session variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMapping {
    /// `sourcePath -> target`, in declaration order. Targets are usually
    /// strings but may be nested shift objects.
    #[serde(default)]
    pub mappings: Map<String, Value>,
    /// Array feeding a dynamic menu on the next node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_array: Option<MenuArray>,
    /// Error responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Error responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// An array in the response that becomes a dynamic menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuArray {
    /// Location of the array in the response (`data.books`).
    pub array_path: String,
    /// Session variable receiving the whole items (`books_items`).
    pub session_variable: String,
    /// Item attribute shown to the user.
    #[serde(default = "default_display_key")]
    pub display_key: String,
    /// Item attribute used for routing; `index` or absent means by position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_key: Option<String>,
}

fn default_display_key() -> String {
    "name".to_string()
}

impl MenuArray {
    /// `session_variable` without a trailing `_items`.
    pub fn base_name(&self) -> &str {
        self.session_variable
            .strip_suffix(ITEMS_SUFFIX)
            .unwrap_or(&self.session_variable)
    }

    /// Shift spec for one array element: keep the item, its display value
    /// and (unless routing by index) its value.
    fn element_spec(&self) -> Value {
        let base = self.base_name();
        let mut element = Map::new();
        element.insert(
            "@".to_string(),
            Value::String(format!("{}[]", self.session_variable)),
        );
        element.insert(
            self.display_key.clone(),
            Value::String(format!("{base}_menu_raw[]")),
        );
        if let Some(value_key) = self
            .value_key
            .as_deref()
            .filter(|key| !key.is_empty() && *key != INDEX_VALUE_KEY)
        {
            element.insert(
                value_key.to_string(),
                Value::String(format!("{base}_values[]")),
            );
        }

        let mut spec = Map::new();
        spec.insert("*".to_string(), Value::Object(element));
        Value::Object(spec)
    }
}

/// Which outcome block the `default` spec starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    Success,
    Error { code: String, message: String },
}

impl ResponseKind {
    /// An error outcome, falling back to the generic code and message.
    pub fn error(code: Option<&str>, message: Option<&str>) -> Self {
        ResponseKind::Error {
            code: code.unwrap_or(DEFAULT_ERROR_CODE).to_string(),
            message: message.unwrap_or(DEFAULT_ERROR_MESSAGE).to_string(),
        }
    }

    fn outcome_block(&self, timestamp: Option<&str>) -> Map<String, Value> {
        let mut block = Map::new();
        match self {
            ResponseKind::Success => {
                block.insert("success".into(), Value::Bool(true));
                insert_timestamp(&mut block, timestamp);
                block.insert("status".into(), Value::String("SUCCEEDED".into()));
            }
            ResponseKind::Error { code, message } => {
                block.insert("success".into(), Value::Bool(false));
                block.insert("error".into(), Value::Bool(true));
                insert_timestamp(&mut block, timestamp);
                block.insert("status".into(), Value::String("FAILED".into()));
                block.insert("errorCode".into(), Value::String(code.clone()));
                block.insert("errorMessage".into(), Value::String(message.clone()));
            }
        }
        block
    }
}

fn insert_timestamp(block: &mut Map<String, Value>, timestamp: Option<&str>) {
    if let Some(ts) = timestamp {
        block.insert("timestamp".into(), Value::String(ts.to_string()));
    }
}

/// Build the `[shift, default]` response spec.
///
/// # Errors
///
/// [`GenerateError::MissingMenuArrayName`] if a menu array names no session
/// variable.
pub fn build_response_spec(
    mapping: &ResponseMapping,
    kind: &ResponseKind,
    options: &GenerateOptions,
) -> Result<Vec<TransformOperation>, GenerateError> {
    let mut shift = Map::new();
    let prefix = if options.wrap_response_input {
        format!("{INPUT_KEY}.")
    } else {
        String::new()
    };

    for (source, target) in &mapping.mappings {
        set_nested_value(&mut shift, &format!("{prefix}{source}"), target.clone());
    }

    if let Some(menu) = &mapping.menu_array {
        if menu.session_variable.is_empty() {
            return Err(GenerateError::MissingMenuArrayName {
                store_attribute: menu.array_path.clone(),
            });
        }
        tracing::debug!(
            array_path = %menu.array_path,
            session_variable = %menu.session_variable,
            "mapping dynamic menu array"
        );
        set_nested_value(
            &mut shift,
            &format!("{prefix}{}", menu.array_path),
            menu.element_spec(),
        );
    }

    let mut default = kind.outcome_block(options.timestamp.as_deref());
    if options.auto_default {
        apply_auto_defaults(&shift, &mut default, options);
    }

    Ok(filter_empty_operations(vec![
        TransformOperation::shift(shift),
        TransformOperation::default_values(default),
    ]))
}

// ---------------------------------------------------------------------------
// Auto-default rule
// ---------------------------------------------------------------------------

/// Every string leaf of `spec`, depth-first in key order.
pub fn extract_target_paths(spec: &Map<String, Value>) -> Vec<String> {
    let mut targets = Vec::new();
    for value in spec.values() {
        collect_strings(value, &mut targets);
    }
    targets
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// How a shift target should be defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DefaultTarget<'a> {
    Scalar(&'a str),
    Array(&'a str),
}

/// Classify `target`; `None` for targets that cannot be defaulted because
/// they are computed by the engine (`&`, `*`, `@`).
fn default_target(target: &str) -> Option<DefaultTarget<'_>> {
    let (name, is_array) = match target.strip_suffix(']').and_then(|t| t.rsplit_once('[')) {
        Some((name, marker)) if marker.is_empty() || marker.starts_with('&') => (name, true),
        _ => (target, false),
    };
    if name.is_empty() || name.contains(|c| matches!(c, '&' | '*' | '@')) {
        return None;
    }
    Some(if is_array {
        DefaultTarget::Array(name)
    } else {
        DefaultTarget::Scalar(name)
    })
}

/// Add a default to `default` for every target of `shift` it lacks.
///
/// Array targets (`name[]`, `name[&1]`) get `[array_default_value]` at
/// `name`; everything else gets `default_value`. Existing entries are never
/// touched, nor are scalars sitting on a target's parent path. Returns the number of defaults added.
pub fn apply_auto_defaults(
    shift: &Map<String, Value>,
    default: &mut Map<String, Value>,
    options: &GenerateOptions,
) -> usize {
    add_defaults(extract_target_paths(shift), default, options)
}

fn add_defaults(
    targets: impl IntoIterator<Item = String>,
    default: &mut Map<String, Value>,
    options: &GenerateOptions,
) -> usize {
    let mut added = 0;
    for target in targets {
        let Some(kind) = default_target(&target) else {
            continue;
        };
        let (path, value) = match kind {
            DefaultTarget::Scalar(path) => (path, Value::String(options.default_value.clone())),
            DefaultTarget::Array(path) => (
                path,
                Value::Array(vec![Value::String(options.array_default_value.clone())]),
            ),
        };
        if write_would_replace(default, path) {
            tracing::debug!(target = %path, "existing default in the way, skipping");
            continue;
        }
        tracing::debug!(target = %path, "adding auto-default");
        set_nested_value(default, path, value);
        added += 1;
    }
    added
}

/// Apply the auto-default rule to an existing operation list.
///
/// Targets are gathered from every `shift` and merged into the first
/// `default` operation, which is appended when there is none. With
/// `auto_default` off the list is only filtered.
///
/// # Errors
///
/// [`GenerateError::InvalidOperation`] if an operation's spec is neither
/// absent nor an object.
pub fn enhance_with_defaults(
    mut ops: Vec<TransformOperation>,
    options: &GenerateOptions,
) -> Result<Vec<TransformOperation>, GenerateError> {
    let mut targets = Vec::new();
    let mut default_index = None;
    for (index, op) in ops.iter().enumerate() {
        let spec = match &op.spec {
            Value::Null => continue,
            Value::Object(spec) => spec,
            other => {
                return Err(GenerateError::InvalidOperation {
                    index,
                    message: format!("spec must be an object, got {other}"),
                })
            }
        };
        match op.operation {
            Operation::Shift => targets.extend(extract_target_paths(spec)),
            Operation::Default if default_index.is_none() => default_index = Some(index),
            _ => {}
        }
    }

    let index = match default_index {
        Some(index) => index,
        None => {
            ops.push(TransformOperation::default_values(Map::new()));
            ops.len() - 1
        }
    };

    let mut default = match std::mem::take(&mut ops[index].spec) {
        Value::Object(spec) => spec,
        _ => Map::new(),
    };
    let added = if options.auto_default {
        add_defaults(targets, &mut default, options)
    } else {
        0
    };
    tracing::debug!(added, "enhanced operation list with defaults");
    ops[index].spec = Value::Object(default);

    Ok(filter_empty_operations(ops))
}
