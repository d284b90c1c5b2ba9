use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::primitives::file_path::FilePath;

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PersistedOperationsConfig {
    /// Whether requests carrying a `persistedQuery` extension are resolved.
    /// When disabled, such requests without a query body are rejected.
    #[serde(default)]
    pub enabled: bool,

    /// Where persisted operation bodies are read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PersistedOperationsSource>,
}

impl PersistedOperationsConfig {
    pub fn is_disabled(&self) -> bool {
        !self.enabled
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub enum PersistedOperationsSource {
    #[serde(rename = "file")]
    File {
        /// Path to a JSON file mapping sha256 hashes to operation bodies.
        /// Both `{"<hash>": "<query>"}` and Apollo persisted query manifests are accepted.
        ///
        /// Can also be set via the `PERSISTED_OPERATIONS_FILE_PATH` environment variable.
        path: FilePath,
    },
}
