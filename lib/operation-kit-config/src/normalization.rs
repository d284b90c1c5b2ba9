use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    /// Extracts inline argument literals into variables, so operations that only differ
    /// in literal argument values share the same identity.
    #[serde(default = "default_extract_variables")]
    pub extract_variables: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            extract_variables: default_extract_variables(),
        }
    }
}

fn default_extract_variables() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IntrospectionConfig {
    /// Whether queries selecting `__schema` or `__type` at the root are accepted.
    #[serde(default = "default_introspection_enabled")]
    pub enabled: bool,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            enabled: default_introspection_enabled(),
        }
    }
}

fn default_introspection_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct CompatibilityConfig {
    /// Report variable validation failures with `400 Bad Request` instead of `200 OK`.
    #[serde(default)]
    pub replace_validation_error_status: bool,
}
