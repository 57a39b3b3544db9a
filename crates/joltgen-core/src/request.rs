//! Builds the request-side `[modify?, shift, default]` transform list.

use serde_json::{Map, Value};

use crate::error::GenerateError;
use crate::field::Field;
use crate::filter::{filter_empty_operations, INPUT_KEY};
use crate::operation::TransformOperation;
use crate::path::{child_object, set_nested_value};
use crate::resolver::{resolve, ResolvedMapping};

/// Key holding the element picked from the session menu array.
pub const SELECTED_ITEM_KEY: &str = "selectedItem";
/// Key holding the zero-based index of the user's menu choice.
pub const SELECTED_INDEX_KEY: &str = "selectedIndex";
/// Where the raw, one-based menu choice arrives.
pub const SELECTION_INPUT_PATH: &str = "input.selection";

/// The `modify-overwrite-beta` step that turns the user's one-based choice
/// into `selectedItem`, an element of the session array `menu_array_name`.
pub fn selection_prelude(menu_array_name: &str) -> TransformOperation {
    let mut spec = Map::new();
    spec.insert(
        SELECTED_INDEX_KEY.to_string(),
        Value::String(format!("=intSubtract(@(1,{SELECTION_INPUT_PATH}),1)")),
    );
    spec.insert(
        SELECTED_ITEM_KEY.to_string(),
        Value::String(format!(
            "=elementAt(@(1,{menu_array_name}),@(1,{SELECTED_INDEX_KEY}))"
        )),
    );
    TransformOperation::modify_overwrite(spec)
}

/// Build the request-side transform specification.
///
/// Fields are processed in order. `static_fields` (`path -> value`) are
/// written into the `default` spec after all fields. Empty operations are
/// dropped from the result.
///
/// # Errors
///
/// - [`GenerateError::MissingTemplateName`] if a query or urlencoded field is
///   present and `template_name` is empty.
/// - [`GenerateError::MissingMenuArrayName`] if a selected-item mapping is
///   present and no menu array name is given or derivable.
pub fn build_request_spec(
    fields: &[Field],
    template_name: &str,
    menu_array_name: Option<&str>,
    static_fields: &Map<String, Value>,
) -> Result<Vec<TransformOperation>, GenerateError> {
    let resolved = fields
        .iter()
        .map(|field| resolve(field, template_name))
        .collect::<Result<Vec<_>, _>>()?;

    let prelude = if resolved.iter().any(ResolvedMapping::needs_selection) {
        let menu = menu_array_for(fields, menu_array_name)?;
        tracing::debug!(menu_array = %menu, "emitting selection prelude");
        Some(selection_prelude(menu))
    } else {
        None
    };

    let mut shift = Map::new();
    let mut default = Map::new();

    for mapping in resolved {
        match mapping {
            ResolvedMapping::StaticWrapped { path, value } => {
                set_nested_value(child_object(&mut default, template_name), &path, value);
            }
            ResolvedMapping::StaticDirect { target, value } => {
                set_nested_value(&mut default, &target, value);
            }
            ResolvedMapping::DynamicWrapped {
                store_attribute,
                target,
            } => {
                set_nested_value(&mut shift, &store_attribute, Value::String(target));
            }
            ResolvedMapping::DynamicInput {
                store_attribute,
                target,
            } => {
                // `input` only comes into existence here.
                set_nested_value(
                    child_object(&mut shift, INPUT_KEY),
                    &store_attribute,
                    Value::String(target),
                );
            }
            ResolvedMapping::SelectedItem { field_name, target } => {
                set_nested_value(
                    child_object(&mut shift, SELECTED_ITEM_KEY),
                    &field_name,
                    Value::String(target),
                );
            }
            ResolvedMapping::Excluded => {}
        }
    }

    for (path, value) in static_fields {
        set_nested_value(&mut default, path, value.clone());
    }

    let ops: Vec<TransformOperation> = prelude
        .into_iter()
        .chain([
            TransformOperation::shift(shift),
            TransformOperation::default_values(default),
        ])
        .collect();

    Ok(filter_empty_operations(ops))
}

/// The caller's menu array name, or the `<NAME>` of the first
/// `<NAME>_selectedItem.` store attribute.
fn menu_array_for<'a>(
    fields: &'a [Field],
    menu_array_name: Option<&'a str>,
) -> Result<&'a str, GenerateError> {
    if let Some(name) = menu_array_name.filter(|name| !name.is_empty()) {
        return Ok(name);
    }
    if let Some(name) = fields.iter().find_map(Field::selected_item_source) {
        return Ok(name);
    }
    let store_attribute = fields
        .iter()
        .find(|field| field.selected_item_field().is_some())
        .map(|field| field.store_attribute.clone())
        .unwrap_or_default();
    Err(GenerateError::MissingMenuArrayName { store_attribute })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Category, MappingType};
    use crate::operation::Operation;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn to_json(ops: &[TransformOperation]) -> Value {
        serde_json::to_value(ops).unwrap()
    }

    #[test]
    fn test_selection_prelude_expressions() {
        let op = selection_prelude("items_menu_BOOK_items");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "operation": "modify-overwrite-beta",
                "spec": {
                    "selectedIndex": "=intSubtract(@(1,input.selection),1)",
                    "selectedItem": "=elementAt(@(1,items_menu_BOOK_items),@(1,selectedIndex))"
                }
            })
        );
    }

    #[test]
    fn test_json_body_fields_nest_under_input() {
        let fields = vec![
            Field::new("pin", Category::Body, MappingType::Dynamic, json!(""))
                .with_store_attribute("PIN"),
            Field::new("account.msisdn", Category::Body, MappingType::Session, json!(""))
                .with_store_attribute("MSISDN"),
            Field::new("channel", Category::Body, MappingType::Static, json!("USSD")),
        ];

        let ops = build_request_spec(&fields, "Login", None, &Map::new()).unwrap();
        assert_eq!(
            to_json(&ops),
            json!([
                {"operation": "shift", "spec": {"input": {"PIN": "pin", "MSISDN": "account.msisdn"}}},
                {"operation": "default", "spec": {"channel": "USSD"}}
            ])
        );
    }

    #[test]
    fn test_static_fields_are_written_last() {
        let fields = vec![Field::new("a", Category::Query, MappingType::Static, json!("1"))];
        let mut extra = Map::new();
        extra.insert("meta.source".to_string(), json!("ussd"));

        let ops = build_request_spec(&fields, "T", None, &extra).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation, Operation::Default);
        assert_eq!(ops[0].spec, json!({"T": {"a": "1"}, "meta": {"source": "ussd"}}));
    }

    #[test]
    fn test_menu_array_name_derived_from_prefix() {
        let fields = vec![Field::new("title", Category::Body, MappingType::Session, json!(""))
            .with_store_attribute("SEARCH_selectedItem.title")];

        let ops = build_request_spec(&fields, "T", None, &Map::new()).unwrap();
        assert_eq!(ops[0].operation, Operation::ModifyOverwriteBeta);
        assert_eq!(
            ops[0].spec["selectedItem"],
            json!("=elementAt(@(1,SEARCH),@(1,selectedIndex))")
        );
        assert_eq!(ops[1].spec, json!({"selectedItem": {"title": "title"}}));
    }

    #[test]
    fn test_missing_menu_array_name() {
        let fields = vec![Field::new("author", Category::Body, MappingType::Session, json!(""))
            .with_store_attribute("selectedItem.author")];

        let err = build_request_spec(&fields, "T", Some(""), &Map::new()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::MissingMenuArrayName { ref store_attribute } if store_attribute == "selectedItem.author"
        ));
    }

    #[test]
    fn test_huge_index_target_is_a_plain_key() {
        let fields = vec![
            Field::new("id", Category::Body, MappingType::Dynamic, json!(""))
                .with_store_attribute("ID")
                .with_target_path("items[18446744073709551615].id"),
            Field::new("kind", Category::Body, MappingType::Static, json!("A"))
                .with_target_path("rows[4000000000]"),
            Field::new("code", Category::Body, MappingType::Static, json!("B"))
                .with_target_path("meta[18446744073709551615].code"),
        ];

        let ops = build_request_spec(&fields, "T", None, &Map::new()).unwrap();
        assert_eq!(
            to_json(&ops),
            json!([
                {"operation": "shift", "spec": {"input": {"ID": "items[18446744073709551615].id"}}},
                {"operation": "default", "spec": {
                    "rows[4000000000]": "A",
                    "meta[18446744073709551615]": {"code": "B"}
                }}
            ])
        );
    }

    #[test]
    fn test_headers_only_produce_nothing() {
        let fields = vec![Field::new("Accept", Category::Header, MappingType::Static, json!("*/*"))];
        let ops = build_request_spec(&fields, "", None, &Map::new()).unwrap();
        assert!(ops.is_empty());
    }
}
