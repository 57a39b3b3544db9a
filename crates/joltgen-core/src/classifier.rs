//! Turns an already-split request description into a flat list of
//! [`Field`]s.
//!
//! Extraction order is headers, URL query string, explicit query parameters,
//! urlencoded body parameters, then JSON body leaves (depth-first, key order).
//! Within one category a later field with the same path replaces the earlier
//! one in place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::GenerateError;
use crate::field::{Category, Field, FieldOverride, MappingType};

/// Path and store attribute used for a body that is not a JSON object.
const RAW_BODY_PATH: &str = "rawBody";
const RAW_BODY_ATTRIBUTE: &str = "rawbody";

/// Base used to read the query string of a relative URL.
const RELATIVE_BASE: &str = "http://localhost/";

/// A request description already split by an external parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRequest {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub query_params: Map<String, Value>,
    #[serde(default)]
    pub body_fields: BodyFields,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Body entries, split by how they were parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyFields {
    /// Parameters from an urlencoded parse (`--data-urlencode`, form bodies).
    #[serde(default)]
    pub urlencoded: Map<String, Value>,
    /// Generic JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
}

/// Where the request is sent. Headers travel here, never through a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTarget {
    /// URL with query string and fragment removed.
    pub endpoint: String,
    pub method: String,
    pub headers: Map<String, Value>,
}

impl RequestTarget {
    pub fn from_request(request: &ParsedRequest) -> Result<Self, GenerateError> {
        Ok(Self {
            endpoint: trim_endpoint(&request.url)?,
            method: request.method.to_ascii_uppercase(),
            headers: request.headers.clone(),
        })
    }
}

/// Classify every header, query parameter and body field of `request`.
pub fn classify(request: &ParsedRequest) -> Result<Vec<Field>, GenerateError> {
    let mut fields = FieldSet::default();

    for (name, value) in &request.headers {
        fields.push(Field::new(
            name.as_str(),
            Category::Header,
            MappingType::Static,
            value.clone(),
        ));
    }

    for (name, value) in url_query_pairs(&request.url)? {
        fields.push(Field::new(
            name,
            Category::Query,
            MappingType::Dynamic,
            Value::String(value),
        ));
    }
    for (name, value) in &request.query_params {
        fields.push(Field::new(
            name.as_str(),
            Category::Query,
            MappingType::Dynamic,
            value.clone(),
        ));
    }

    for (name, value) in &request.body_fields.urlencoded {
        fields.push(
            Field::new(name.as_str(), Category::Body, MappingType::Dynamic, value.clone())
                .urlencoded(),
        );
    }

    match &request.body_fields.json {
        Some(Value::Object(body)) => extract_json_fields(body, "", &mut fields),
        Some(Value::Null) | None => {}
        Some(other) => fields.push(
            Field::new(RAW_BODY_PATH, Category::Body, MappingType::Dynamic, other.clone())
                .with_store_attribute(RAW_BODY_ATTRIBUTE),
        ),
    }

    let fields = fields.into_vec();
    tracing::debug!(
        method = %request.method,
        count = fields.len(),
        "classified request fields"
    );
    Ok(fields)
}

/// Apply user overrides to classified fields.
///
/// Overrides that match no field are reported and otherwise ignored.
pub fn apply_overrides(fields: &mut [Field], overrides: &[FieldOverride]) {
    for edit in overrides {
        let mut matched = false;
        for field in fields.iter_mut().filter(|f| edit.matches(f)) {
            edit.apply(field);
            matched = true;
        }
        if !matched {
            tracing::warn!(
                path = %edit.path,
                category = ?edit.category,
                "override matches no classified field"
            );
        }
    }
}

/// Case-insensitive header lookup. Non-string values are not headers.
pub fn find_header<'h>(headers: &'h Map<String, Value>, name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_str())
}

// ---------------------------------------------------------------------------
// JSON body walk
// ---------------------------------------------------------------------------

fn extract_json_fields(obj: &Map<String, Value>, prefix: &str, fields: &mut FieldSet) {
    for (key, value) in obj {
        let full_path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        // An array of objects is described by its first element.
        let first_object = value
            .as_array()
            .and_then(|items| items.first())
            .and_then(Value::as_object);

        match (value, first_object) {
            (Value::Object(child), _) => extract_json_fields(child, &full_path, fields),
            (_, Some(first)) => extract_json_fields(first, &format!("{full_path}[0]"), fields),
            _ => fields.push(
                Field::new(
                    full_path.as_str(),
                    Category::Body,
                    MappingType::Dynamic,
                    value.clone(),
                )
                .with_store_attribute(key.as_str()),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

fn parse_url(raw: &str) -> Result<Url, GenerateError> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(raw))
            .map_err(|e| invalid_url(raw, e)),
        Err(e) => Err(invalid_url(raw, e)),
    }
}

fn invalid_url(raw: &str, err: url::ParseError) -> GenerateError {
    GenerateError::InvalidUrl {
        url: raw.to_string(),
        message: err.to_string(),
    }
}

fn url_query_pairs(raw: &str) -> Result<Vec<(String, String)>, GenerateError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let url = parse_url(raw)?;
    Ok(url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

fn trim_endpoint(raw: &str) -> Result<String, GenerateError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            Ok(url.to_string())
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // Validate the relative form, then cut the query off the original text.
            parse_url(raw)?;
            let end = raw.find(|c| c == '?' || c == '#').unwrap_or(raw.len());
            Ok(raw[..end].to_string())
        }
        Err(e) => Err(invalid_url(raw, e)),
    }
}

// ---------------------------------------------------------------------------
// Deduplicating accumulator
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FieldSet {
    fields: Vec<Field>,
    index: HashMap<(Category, String), usize>,
}

impl FieldSet {
    fn push(&mut self, field: Field) {
        let key = (field.category, field.path.clone());
        match self.index.get(&key) {
            Some(&pos) => {
                tracing::debug!(path = %field.path, "duplicate field path, keeping the later value");
                self.fields[pos] = field;
            }
            None => {
                self.index.insert(key, self.fields.len());
                self.fields.push(field);
            }
        }
    }

    fn into_vec(self) -> Vec<Field> {
        self.fields
    }
}
