//! # joltgen-core
//!
//! Generates declarative JOLT transform specifications for API templates.
//!
//! Given the fields of a parsed HTTP request and the user's mapping choices,
//! [`generate`] derives:
//!
//! - a **request spec** (`[modify?, shift, default]`) that reshapes runtime
//!   input into the template's request document,
//! - a **form-body spec** that folds query or urlencoded fields into a single
//!   `key=value&key=value` string, when the transport needs one,
//! - optional **response** and **error** specs with auto-populated defaults,
//! - optional **session** and **menu** specs for templates that feed a
//!   dynamic menu.
//!
//! Generation is pure: identical inputs produce byte-identical output.
//!
//! ```
//! use joltgen_core::{generate, Category, Field, GenerateOptions, GenerateRequest, MappingType};
//! use serde_json::json;
//!
//! let request = GenerateRequest {
//!     fields: vec![
//!         Field::new("grant_type", Category::Body, MappingType::Dynamic, json!("")).urlencoded(),
//!     ],
//!     template_name: "SYSTEM_TOKEN".into(),
//!     method: "POST".into(),
//!     ..Default::default()
//! };
//! let specs = generate(&request, &GenerateOptions::default()).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&specs.request_spec).unwrap(),
//!     json!([{"operation": "shift", "spec": {"grant_type": "SYSTEM_TOKEN.grant_type"}}])
//! );
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod form_body;
pub mod operation;
pub mod path;
pub mod request;
pub mod resolver;
pub mod response;
pub mod session;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use classifier::{apply_overrides, classify, ParsedRequest, RequestTarget};
pub use config::GenerateOptions;
pub use error::GenerateError;
pub use field::{Category, Field, FieldOverride, MappingType, ValueType};
pub use filter::{filter_empty_operations, is_empty_operation};
pub use form_body::build_form_body_spec;
pub use operation::{parse_operations, Operation, TransformOperation};
pub use path::{get_nested_value, set_nested_value};
pub use request::build_request_spec;
pub use resolver::{resolve, ResolvedMapping};
pub use response::{
    build_response_spec, enhance_with_defaults, extract_target_paths, MenuArray, ResponseKind,
    ResponseMapping,
};
pub use session::{build_menu_spec, build_session_spec, menu_key};

/// Everything needed to generate the specs of one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Namespace for query and urlencoded fields; required when any exist.
    #[serde(default)]
    pub template_name: String,
    /// Session array that selected-item mappings pick from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_array_name: Option<String>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: Map<String, Value>,
    /// Extra constants (`path -> value`) for the request `default` spec.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub static_fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_response: Option<ResponseMapping>,
    /// Present when the next node is a dynamic menu fed by this template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_menu: Option<DynamicMenu>,
}

/// Dynamic menu fed by the template's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicMenu {
    /// Session variable holding the menu items (`fiction_items`).
    pub session_variable: String,
}

/// The generated specifications of one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSpecs {
    pub request_spec: Vec<TransformOperation>,
    /// `None` (serialized as `null`) when no form body applies.
    pub form_body_spec: Option<Vec<TransformOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_spec: Option<Vec<TransformOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_spec: Option<Vec<TransformOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_spec: Option<Vec<TransformOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_spec: Option<Vec<TransformOperation>>,
}

/// Generate every spec `request` asks for.
///
/// # Errors
///
/// Returns [`GenerateError`] when a required template or menu array name is
/// missing.
pub fn generate(
    request: &GenerateRequest,
    options: &GenerateOptions,
) -> Result<GeneratedSpecs, GenerateError> {
    tracing::debug!(
        template = %request.template_name,
        method = %request.method,
        fields = request.fields.len(),
        "generating specs"
    );

    let request_spec = build_request_spec(
        &request.fields,
        &request.template_name,
        request.menu_array_name.as_deref(),
        &request.static_fields,
    )?;

    let form_body_spec = build_form_body_spec(
        &request.method,
        &request.headers,
        &request.fields,
        &request.template_name,
    )?;

    let response_spec = request
        .response
        .as_ref()
        .map(|mapping| build_response_spec(mapping, &ResponseKind::Success, options))
        .transpose()?;

    let error_spec = request
        .error_response
        .as_ref()
        .map(|mapping| {
            let kind = ResponseKind::error(
                mapping.error_code.as_deref(),
                mapping.error_message.as_deref(),
            );
            build_response_spec(mapping, &kind, options)
        })
        .transpose()?;

    let (session_spec, menu_spec) = match &request.dynamic_menu {
        Some(menu) => (
            Some(build_session_spec(
                &request.template_name,
                &menu.session_variable,
            )?),
            Some(build_menu_spec(&menu_key(&menu.session_variable))?),
        ),
        None => (None, None),
    };

    Ok(GeneratedSpecs {
        request_spec,
        form_body_spec,
        response_spec,
        error_spec,
        session_spec,
        menu_spec,
    })
}
