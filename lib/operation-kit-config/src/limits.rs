use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size of a raw GraphQL request body, in bytes.
    /// Larger bodies are rejected before any parsing is attempted.
    ///
    /// Can also be set via the `MAX_REQUEST_BODY_SIZE` environment variable.
    #[serde(default = "default_max_request_body_size")]
    pub max_request_body_size: usize,

    /// Maximum length of an operation name. `0` disables the check.
    #[serde(default)]
    pub max_operation_name_length: usize,

    /// Maximum nesting depth of fields, counted after fragment spreads are expanded.
    /// `0` disables the check.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of fields in an operation, counted after fragment spreads are expanded.
    /// Each use of a fragment counts its fields again. `0` disables the check.
    #[serde(default = "default_max_total_fields")]
    pub max_total_fields: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_size: default_max_request_body_size(),
            max_operation_name_length: 0,
            max_depth: default_max_depth(),
            max_total_fields: default_max_total_fields(),
        }
    }
}

fn default_max_request_body_size() -> usize {
    // 5MB
    5 * 1024 * 1024
}

fn default_max_depth() -> usize {
    200
}

fn default_max_total_fields() -> usize {
    3500
}
