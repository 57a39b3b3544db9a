//! Configuration for spec generation.

use serde::{Deserialize, Serialize};

/// Default written for every auto-defaulted scalar target.
pub const DEFAULT_VALUE: &str = "0";
/// Single element of the default written for auto-defaulted array targets.
pub const ARRAY_DEFAULT_VALUE: &str = "unable to fetch";

/// Options for spec generation.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `auto-default`, `default-value`).
/// This naming convention is part of the public contract for config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenerateOptions {
    /// Populate `default` entries for every target referenced by a response
    /// `shift`. Default: true.
    pub auto_default: bool,
    /// Literal written for scalar auto-defaults. Default: `"0"`.
    pub default_value: String,
    /// Literal placed in the one-element array written for array targets
    /// (`name[]`). Default: `"unable to fetch"`.
    pub array_default_value: String,
    /// Nest response source paths under the `input` key of the shift spec.
    /// Default: true.
    pub wrap_response_input: bool,
    /// Timestamp written into response outcome blocks. `None` omits the key,
    /// which keeps generation byte-for-byte reproducible.
    pub timestamp: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            auto_default: true,
            default_value: DEFAULT_VALUE.to_string(),
            array_default_value: ARRAY_DEFAULT_VALUE.to_string(),
            wrap_response_input: true,
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_options_serde_round_trip() {
        let opts = GenerateOptions {
            auto_default: false,
            default_value: "-".to_string(),
            array_default_value: "none".to_string(),
            wrap_response_input: false,
            timestamp: Some("2025-09-24T08:10:54.262Z".to_string()),
        };

        let json = serde_json::to_string(&opts).unwrap();

        assert!(json.contains("\"auto-default\""));
        assert!(json.contains("\"array-default-value\""));
        assert!(json.contains("\"wrap-response-input\""));

        let deserialized: GenerateOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let opts: GenerateOptions = serde_json::from_str(r#"{"auto-default": false}"#).unwrap();
        assert!(!opts.auto_default);
        assert_eq!(opts.default_value, DEFAULT_VALUE);
        assert_eq!(opts.array_default_value, ARRAY_DEFAULT_VALUE);
        assert!(opts.wrap_response_input);
        assert_eq!(opts.timestamp, None);
    }
}
