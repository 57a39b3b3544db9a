//! Field records: one mappable datum extracted from a request description.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker inside a store attribute that selects a field of the menu item the
/// end user picked (`selectedItem.title`, `SEARCH_selectedItem.title`).
pub const SELECTED_ITEM_MARKER: &str = "selectedItem.";

/// Where a field lives in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Query,
    Body,
    Header,
}

/// How a field's value is supplied at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    /// Constant captured at design time.
    Static,
    /// Read from the runtime input under `storeAttribute`.
    Dynamic,
    /// Read from session state, possibly off a selected menu item.
    Session,
}

/// JSON type of the value observed when the field was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Null => ValueType::Null,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }
}

/// A single mappable field.
///
/// Every attribute is always present. Empty strings stand for "unset"
/// (`store_attribute`, `target_path`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Position of the field in its source container (`data.user.name`, `items[0].id`).
    pub path: String,
    /// Runtime input/session key the value is read from.
    #[serde(default)]
    pub store_attribute: String,
    pub category: Category,
    pub mapping_type: MappingType,
    /// Observed literal (static) or example value (dynamic).
    #[serde(default, alias = "staticValue")]
    pub value: Value,
    #[serde(default = "default_value_type")]
    pub value_type: ValueType,
    /// Destination in the output document; empty means `path`.
    #[serde(default)]
    pub target_path: String,
    /// Body field that came from an urlencoded parameter parse.
    #[serde(default)]
    pub is_urlencoded: bool,
}

fn default_value_type() -> ValueType {
    ValueType::String
}

impl Field {
    /// Build a field whose store attribute and target both equal `path`.
    pub fn new(
        path: impl Into<String>,
        category: Category,
        mapping_type: MappingType,
        value: Value,
    ) -> Self {
        let path = path.into();
        Self {
            store_attribute: path.clone(),
            target_path: path.clone(),
            path,
            category,
            mapping_type,
            value_type: ValueType::of(&value),
            value,
            is_urlencoded: false,
        }
    }

    pub fn with_store_attribute(mut self, store_attribute: impl Into<String>) -> Self {
        self.store_attribute = store_attribute.into();
        self
    }

    pub fn with_target_path(mut self, target_path: impl Into<String>) -> Self {
        self.target_path = target_path.into();
        self
    }

    pub fn urlencoded(mut self) -> Self {
        self.is_urlencoded = true;
        self
    }

    /// Destination path, falling back to `path` when no target was set.
    pub fn effective_target(&self) -> &str {
        if self.target_path.is_empty() {
            &self.path
        } else {
            &self.target_path
        }
    }

    /// Query parameters and urlencoded body parameters are namespaced under
    /// the template name.
    pub fn needs_template_wrapping(&self) -> bool {
        match self.category {
            Category::Query => true,
            Category::Body => self.is_urlencoded,
            Category::Header => false,
        }
    }

    /// The field name picked off the selected menu item, if this is a
    /// session-selected-item mapping.
    pub fn selected_item_field(&self) -> Option<&str> {
        if self.mapping_type != MappingType::Session {
            return None;
        }
        self.store_attribute
            .split_once(SELECTED_ITEM_MARKER)
            .map(|(_, field_name)| field_name)
    }

    /// Menu array named by a `<NAME>_selectedItem.` prefix, if present.
    pub fn selected_item_source(&self) -> Option<&str> {
        self.selected_item_field()?;
        let (prefix, _) = self.store_attribute.split_once(SELECTED_ITEM_MARKER)?;
        prefix.strip_suffix('_').filter(|name| !name.is_empty())
    }
}

/// A user edit applied to a classified field before generation.
///
/// Matched against fields by `(category, path)`. Present attributes replace
/// the classifier's choice unconditionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOverride {
    pub category: Category,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_type: Option<MappingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_attribute: Option<String>,
    #[serde(
        default,
        alias = "staticValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

impl FieldOverride {
    pub fn matches(&self, field: &Field) -> bool {
        self.category == field.category && self.path == field.path
    }

    /// Apply this override to `field`.
    ///
    /// Switching a field to `static` without naming a store attribute resets
    /// the store attribute to the field's path.
    pub fn apply(&self, field: &mut Field) {
        if let Some(mapping_type) = self.mapping_type {
            field.mapping_type = mapping_type;
            if mapping_type == MappingType::Static && self.store_attribute.is_none() {
                field.store_attribute = field.path.clone();
            }
        }
        if let Some(store_attribute) = &self.store_attribute {
            field.store_attribute = store_attribute.clone();
        }
        if let Some(value) = &self.value {
            field.value_type = ValueType::of(value);
            field.value = value.clone();
        }
        if let Some(target_path) = &self.target_path {
            field.target_path = target_path.clone();
        }
    }
}
