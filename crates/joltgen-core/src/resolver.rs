//! Decides where each field lands in the generated request spec.
//!
//! Wrapping is fixed by transport alone: query parameters and urlencoded body
//! parameters live under the template namespace, everything else does not.
//! The mapping type then picks the operation (`shift` or `default`) and the
//! key form. Nothing else is allowed to reorder these two decisions.

use serde_json::Value;

use crate::error::GenerateError;
use crate::field::{Category, Field, MappingType};

/// Final placement of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMapping {
    /// `default.spec[template][path] = value`.
    StaticWrapped { path: String, value: Value },
    /// `default.spec[target] = value`.
    StaticDirect { target: String, value: Value },
    /// `shift.spec[store_attribute] = "<template>.<path>"`.
    DynamicWrapped { store_attribute: String, target: String },
    /// `shift.spec.input[store_attribute] = target`.
    DynamicInput { store_attribute: String, target: String },
    /// `shift.spec.selectedItem[field_name] = target`; needs the selection prelude.
    SelectedItem { field_name: String, target: String },
    /// Contributes nothing (headers, unmapped fields).
    Excluded,
}

impl ResolvedMapping {
    pub fn needs_selection(&self) -> bool {
        matches!(self, ResolvedMapping::SelectedItem { .. })
    }
}

/// Resolve a single field against `template_name`.
///
/// Returns [`GenerateError::MissingTemplateName`] when the field needs
/// template wrapping and `template_name` is empty.
pub fn resolve(field: &Field, template_name: &str) -> Result<ResolvedMapping, GenerateError> {
    if field.category == Category::Header {
        return Ok(ResolvedMapping::Excluded);
    }

    let wrapped = field.needs_template_wrapping();
    if wrapped && template_name.is_empty() {
        return Err(GenerateError::MissingTemplateName {
            path: field.path.clone(),
        });
    }

    let resolved = match field.mapping_type {
        MappingType::Static if wrapped => ResolvedMapping::StaticWrapped {
            path: field.path.clone(),
            value: field.value.clone(),
        },
        MappingType::Static => ResolvedMapping::StaticDirect {
            target: field.effective_target().to_string(),
            value: field.value.clone(),
        },
        MappingType::Dynamic | MappingType::Session => resolve_runtime(field, template_name, wrapped),
    };

    tracing::debug!(
        path = %field.path,
        category = ?field.category,
        mapping = ?resolved,
        "resolved field"
    );
    Ok(resolved)
}

fn resolve_runtime(field: &Field, template_name: &str, wrapped: bool) -> ResolvedMapping {
    if let Some(field_name) = field.selected_item_field() {
        if field_name.is_empty() {
            tracing::warn!(
                path = %field.path,
                store_attribute = %field.store_attribute,
                "selected-item mapping names no field, skipping"
            );
            return ResolvedMapping::Excluded;
        }
        return ResolvedMapping::SelectedItem {
            field_name: field_name.to_string(),
            target: field.effective_target().to_string(),
        };
    }

    if field.store_attribute.is_empty() {
        tracing::warn!(path = %field.path, "runtime field has no store attribute, skipping");
        return ResolvedMapping::Excluded;
    }

    if wrapped {
        ResolvedMapping::DynamicWrapped {
            store_attribute: field.store_attribute.clone(),
            target: format!("{template_name}.{}", field.path),
        }
    } else {
        ResolvedMapping::DynamicInput {
            store_attribute: field.store_attribute.clone(),
            target: field.effective_target().to_string(),
        }
    }
}
