//! Session-merge and menu specs for templates that feed a dynamic menu.

use serde_json::{json, Map, Value};

use crate::error::GenerateError;
use crate::operation::TransformOperation;
use crate::response::ITEMS_SUFFIX;

/// Session key that holds the node the flow is currently on.
pub const LATEST_NODE_KEY: &str = "latestCurrentNode";
/// Output prefix of menu entries.
pub const MENU_KEY: &str = "menu";

/// Session key of the raw display values for `session_variable`.
///
/// ```
/// use joltgen_core::session::menu_key;
/// assert_eq!(menu_key("fiction_items"), "fiction_menu_raw");
/// assert_eq!(menu_key("books"), "books_menu_raw");
/// ```
pub fn menu_key(session_variable: &str) -> String {
    let base = session_variable
        .strip_suffix(ITEMS_SUFFIX)
        .unwrap_or(session_variable);
    format!("{base}_menu_raw")
}

/// `[shift {menu_key: {"*": "menu.&1"}}]`
pub fn build_menu_spec(menu_key: &str) -> Result<Vec<TransformOperation>, GenerateError> {
    if menu_key.is_empty() {
        return Err(GenerateError::MissingMenuArrayName {
            store_attribute: String::new(),
        });
    }
    let mut spec = Map::new();
    spec.insert(menu_key.to_string(), json!({"*": format!("{MENU_KEY}.&1")}));
    Ok(vec![TransformOperation::shift(spec)])
}

/// Spec merging the session with the menu array of `template_id`.
///
/// Flattens the session, files each element of `menu_array_name` under
/// the template, records the current node, then drops the scratch keys.
pub fn build_session_spec(
    template_id: &str,
    menu_array_name: &str,
) -> Result<Vec<TransformOperation>, GenerateError> {
    if template_id.is_empty() {
        return Err(GenerateError::MissingTemplateName {
            path: menu_array_name.to_string(),
        });
    }
    if menu_array_name.is_empty() {
        return Err(GenerateError::MissingMenuArrayName {
            store_attribute: template_id.to_string(),
        });
    }

    let flatten = object(json!({"*": {"*": "&"}}));

    let mut file_menu = Map::new();
    file_menu.insert("*".to_string(), Value::String("&".to_string()));
    file_menu.insert(
        menu_array_name.to_string(),
        json!({"*": {"@": format!("{template_id}.&")}}),
    );

    let mut current = Map::new();
    current.insert(
        "currentNode".to_string(),
        Value::String(format!("@(1,{LATEST_NODE_KEY})")),
    );
    current.insert(
        template_id.to_string(),
        Value::String("=recursivelySortKeys".to_string()),
    );

    let mut scratch = Map::new();
    scratch.insert(menu_array_name.to_string(), Value::String(String::new()));
    scratch.insert(LATEST_NODE_KEY.to_string(), Value::String(String::new()));

    tracing::debug!(template_id, menu_array_name, "built session spec");
    Ok(vec![
        TransformOperation::shift(flatten),
        TransformOperation::shift(file_menu),
        TransformOperation::modify_overwrite(current),
        TransformOperation::remove(scratch),
    ])
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_menu_spec() {
        let ops = build_menu_spec("fiction_menu_raw").unwrap();
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([{"operation": "shift", "spec": {"fiction_menu_raw": {"*": "menu.&1"}}}])
        );
        assert!(build_menu_spec("").is_err());
    }

    #[test]
    fn test_session_spec_steps() {
        let ops = build_session_spec("BOOKS", "fiction_items").unwrap();
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"operation": "shift", "spec": {"*": {"*": "&"}}},
                {"operation": "shift", "spec": {"*": "&", "fiction_items": {"*": {"@": "BOOKS.&"}}}},
                {"operation": "modify-overwrite-beta", "spec": {
                    "currentNode": "@(1,latestCurrentNode)",
                    "BOOKS": "=recursivelySortKeys"
                }},
                {"operation": "remove", "spec": {"fiction_items": "", "latestCurrentNode": ""}}
            ])
        );
    }

    #[test]
    fn test_session_spec_requires_names() {
        assert!(matches!(
            build_session_spec("", "items"),
            Err(GenerateError::MissingTemplateName { .. })
        ));
        assert!(matches!(
            build_session_spec("BOOKS", ""),
            Err(GenerateError::MissingMenuArrayName { .. })
        ));
    }
}
