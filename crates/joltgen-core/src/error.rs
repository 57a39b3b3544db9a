//! Error types for spec generation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template name is required to wrap field '{path}'")]
    MissingTemplateName { path: String },

    #[error("Menu array name is required for selected-item field '{store_attribute}'")]
    MissingMenuArrayName { store_attribute: String },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid operation at index {index}: {message}")]
    InvalidOperation { index: usize, message: String },
}
