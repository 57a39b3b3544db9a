//! Form-body specs: fold template fields into a single `key=value&key=value`
//! string.

use serde_json::{Map, Value};

use crate::classifier::find_header;
use crate::error::GenerateError;
use crate::field::{Category, Field};
use crate::operation::TransformOperation;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Output key of the concatenated body.
pub const FORM_BODY_KEY: &str = "formBody";

/// Whether a form body has to be assembled for this request at all.
///
/// True for a GET with at least one query field, or a POST whose
/// `Content-Type` mentions the urlencoded media type.
pub fn needs_form_body(method: &str, headers: &Map<String, Value>, fields: &[Field]) -> bool {
    if method.eq_ignore_ascii_case("GET") {
        return fields.iter().any(|f| f.category == Category::Query);
    }
    if method.eq_ignore_ascii_case("POST") {
        return find_header(headers, "content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(FORM_URLENCODED));
    }
    false
}

/// `=concat('a=',@(1,a),'&','b=',@(1,b))` over `keys`, in the given order.
pub fn concat_expression<'k>(keys: impl IntoIterator<Item = &'k str>) -> String {
    let mut parts = Vec::new();
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            parts.push("'&'".to_string());
        }
        parts.push(format!("'{key}='"));
        parts.push(format!("@(1,{key})"));
    }
    format!("=concat({})", parts.join(","))
}

/// Build the `[shift, modify-overwrite-beta, remove]` form-body list.
///
/// Returns `Ok(None)` when no form body applies or no field is eligible.
/// Eligible fields are query parameters and urlencoded body parameters, in
/// their original order.
pub fn build_form_body_spec(
    method: &str,
    headers: &Map<String, Value>,
    fields: &[Field],
    template_name: &str,
) -> Result<Option<Vec<TransformOperation>>, GenerateError> {
    if !needs_form_body(method, headers, fields) {
        return Ok(None);
    }

    let eligible: Vec<&str> = fields
        .iter()
        .filter(|f| f.needs_template_wrapping())
        .map(|f| f.path.as_str())
        .collect();

    let Some(first) = eligible.first() else {
        return Ok(None);
    };
    if template_name.is_empty() {
        return Err(GenerateError::MissingTemplateName {
            path: first.to_string(),
        });
    }

    let mut identity = Map::new();
    let mut removals = Map::new();
    for path in &eligible {
        identity.insert(path.to_string(), Value::String(path.to_string()));
        removals.insert(path.to_string(), Value::String(String::new()));
    }

    let mut shift = Map::new();
    shift.insert(template_name.to_string(), Value::Object(identity));

    let mut modify = Map::new();
    let expression = concat_expression(eligible.iter().copied());
    tracing::debug!(method, fields = eligible.len(), %expression, "built form body");
    modify.insert(FORM_BODY_KEY.to_string(), Value::String(expression));

    Ok(Some(vec![
        TransformOperation::shift(shift),
        TransformOperation::modify_overwrite(modify),
        TransformOperation::remove(removals),
    ]))
}
